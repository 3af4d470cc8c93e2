//! Environment configuration.
//!
//! Loaded once per process from environment variables, with a hardcoded
//! fallback for every value. Unset variables take the default; variables
//! that are set but unparsable are reported as [`E2eError::Config`].

use crate::auth::Credentials;
use crate::result::{E2eError, E2eResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default application URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default whole-test timeout (60 seconds)
pub const DEFAULT_TEST_TIMEOUT_MS: u64 = 60_000;

/// Default navigation timeout (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default element/action timeout (10 seconds)
pub const DEFAULT_ACTION_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for soft checks and banner reads (2 seconds)
pub const DEFAULT_SOFT_TIMEOUT_MS: u64 = 2_000;

/// Target environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Developer machine
    #[default]
    Local,
    /// Shared staging deployment
    Staging,
    /// Production (read-mostly smoke runs)
    Production,
}

impl Environment {
    /// Parse an environment name (case-insensitive)
    pub fn parse(value: &str) -> E2eResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" | "dev" | "development" => Ok(Self::Local),
            "staging" | "stage" | "qa" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(E2eError::config(
                "TEST_ENV",
                format!("unknown environment '{other}'"),
            )),
        }
    }

    /// Name as used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable suite configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Base URL of the application under test
    pub base_url: String,
    /// Base URL of the admin area
    pub admin_base_url: String,
    /// Regular test user
    pub credentials: Credentials,
    /// Administrator
    pub admin_credentials: Credentials,
    /// Whole-test timeout in milliseconds
    pub test_timeout_ms: u64,
    /// Navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
    /// Element wait / action timeout in milliseconds
    pub action_timeout_ms: u64,
    /// Soft check timeout in milliseconds
    pub soft_timeout_ms: u64,
    /// Target environment
    pub environment: Environment,
    /// Run the browser headless
    pub headless: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            admin_base_url: format!("{DEFAULT_BASE_URL}/admin"),
            credentials: Credentials::new("user@example.com", "secret123"),
            admin_credentials: Credentials::new("admin@example.com", "admin123"),
            test_timeout_ms: DEFAULT_TEST_TIMEOUT_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            action_timeout_ms: DEFAULT_ACTION_TIMEOUT_MS,
            soft_timeout_ms: DEFAULT_SOFT_TIMEOUT_MS,
            environment: Environment::Local,
            headless: true,
        }
    }
}

impl EnvConfig {
    /// Create a configuration with defaults only
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the process environment
    pub fn from_env() -> E2eResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let base_url = get("BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let admin_base_url = get("ADMIN_BASE_URL")
            .map(|v| v.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{base_url}/admin"));

        let credentials = Credentials::new(
            get("TEST_USER_EMAIL").unwrap_or(defaults.credentials.email),
            get("TEST_USER_PASSWORD").unwrap_or(defaults.credentials.password),
        );
        let admin_credentials = Credentials::new(
            get("ADMIN_EMAIL").unwrap_or(defaults.admin_credentials.email),
            get("ADMIN_PASSWORD").unwrap_or(defaults.admin_credentials.password),
        );

        let environment = match get("TEST_ENV") {
            Some(v) => Environment::parse(&v)?,
            None => defaults.environment,
        };

        let config = Self {
            base_url,
            admin_base_url,
            credentials,
            admin_credentials,
            test_timeout_ms: parse_ms("TEST_TIMEOUT", get("TEST_TIMEOUT"), defaults.test_timeout_ms)?,
            navigation_timeout_ms: parse_ms(
                "NAVIGATION_TIMEOUT",
                get("NAVIGATION_TIMEOUT"),
                defaults.navigation_timeout_ms,
            )?,
            action_timeout_ms: parse_ms(
                "ACTION_TIMEOUT",
                get("ACTION_TIMEOUT"),
                defaults.action_timeout_ms,
            )?,
            soft_timeout_ms: parse_ms(
                "SOFT_CHECK_TIMEOUT",
                get("SOFT_CHECK_TIMEOUT"),
                defaults.soft_timeout_ms,
            )?,
            environment,
            headless: parse_bool("HEADLESS", get("HEADLESS"), defaults.headless)?,
        };

        config.validate()?;
        tracing::debug!(
            environment = %config.environment,
            base_url = %config.base_url,
            "loaded environment configuration"
        );
        Ok(config)
    }

    /// Check required values
    pub fn validate(&self) -> E2eResult<()> {
        for (key, url) in [("BASE_URL", &self.base_url), ("ADMIN_BASE_URL", &self.admin_base_url)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(E2eError::config(key, format!("'{url}' is not an http(s) URL")));
            }
        }
        for (key, value) in [
            ("TEST_TIMEOUT", self.test_timeout_ms),
            ("NAVIGATION_TIMEOUT", self.navigation_timeout_ms),
            ("ACTION_TIMEOUT", self.action_timeout_ms),
            ("SOFT_CHECK_TIMEOUT", self.soft_timeout_ms),
        ] {
            if value == 0 {
                return Err(E2eError::config(key, "timeout must be greater than zero"));
            }
        }
        if self.credentials.email.is_empty() || self.credentials.password.is_empty() {
            return Err(E2eError::config("TEST_USER_EMAIL", "credentials must not be empty"));
        }
        Ok(())
    }

    /// Absolute URL for an application path
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// Absolute URL for an admin-area path
    #[must_use]
    pub fn admin_url_for(&self, path: &str) -> String {
        join_url(&self.admin_base_url, path)
    }

    /// Navigation timeout
    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// Element wait / action timeout
    #[must_use]
    pub const fn action_timeout(&self) -> Duration {
        Duration::from_millis(self.action_timeout_ms)
    }

    /// Soft check timeout
    #[must_use]
    pub const fn soft_timeout(&self) -> Duration {
        Duration::from_millis(self.soft_timeout_ms)
    }

    /// Whole-test timeout
    #[must_use]
    pub const fn test_timeout(&self) -> Duration {
        Duration::from_millis(self.test_timeout_ms)
    }

    /// Set base URL (admin URL follows)
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let url = url.trim_end_matches('/').to_string();
        self.admin_base_url = format!("{url}/admin");
        self.base_url = url;
        self
    }

    /// Set test user credentials
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set navigation timeout
    #[must_use]
    pub const fn with_navigation_timeout(mut self, timeout_ms: u64) -> Self {
        self.navigation_timeout_ms = timeout_ms;
        self
    }

    /// Set action timeout
    #[must_use]
    pub const fn with_action_timeout(mut self, timeout_ms: u64) -> Self {
        self.action_timeout_ms = timeout_ms;
        self
    }

    /// Set soft check timeout
    #[must_use]
    pub const fn with_soft_timeout(mut self, timeout_ms: u64) -> Self {
        self.soft_timeout_ms = timeout_ms;
        self
    }

    /// Set the per-test time limit
    #[must_use]
    pub const fn with_test_timeout(mut self, timeout_ms: u64) -> Self {
        self.test_timeout_ms = timeout_ms;
        self
    }

    /// Set environment
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        format!("{base}/")
    } else {
        format!("{base}/{path}")
    }
}

fn parse_ms(key: &str, value: Option<String>, default: u64) -> E2eResult<u64> {
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| E2eError::config(key, format!("'{v}' is not a number of milliseconds: {e}")))
    })
}

fn parse_bool(key: &str, value: Option<String>, default: bool) -> E2eResult<bool> {
    let Some(v) = value else {
        return Ok(default);
    };
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(E2eError::config(key, format!("'{other}' is not a boolean"))),
    }
}
