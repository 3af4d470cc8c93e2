//! Result and error types for the EBMS suite.

use thiserror::Error;

/// Result type for suite operations
pub type E2eResult<T> = Result<T, E2eError>;

/// Errors that can occur while driving the EBMS UI
#[derive(Debug, Error)]
pub enum E2eError {
    /// Navigation did not reach its ready signal in time
    #[error("Navigation to {url} timed out after {ms}ms")]
    NavigationTimeout {
        /// URL being loaded
        url: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Element did not become visible in time
    #[error("Element {selector} not visible after {ms}ms")]
    ElementNotVisible {
        /// Selector that was waited on
        selector: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Test body overran the per-test time limit
    #[error("Test body timed out after {ms}ms")]
    TestTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Fixture login completed but no post-login signal was found
    #[error("Authentication setup failed: {message}")]
    AuthenticationSetupFailed {
        /// Error message
        message: String,
    },

    /// Navigation error reported by the browser
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Element action failed (fill, click, check, select)
    #[error("Action on {selector} failed: {message}")]
    Element {
        /// Selector the action targeted
        selector: String,
        /// Error message
        message: String,
    },

    /// Malformed locator expression
    #[error("Invalid selector: {message}")]
    InvalidSelector {
        /// Error message
        message: String,
    },

    /// URL pattern could not be compiled
    #[error("Invalid URL pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Pattern source
        pattern: String,
        /// Error message
        message: String,
    },

    /// Environment configuration could not be parsed
    #[error("Configuration error for {key}: {message}")]
    Config {
        /// Environment variable or field name
        key: String,
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Fixture error (misuse of the lifecycle)
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Generic driver error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl E2eError {
    /// Whether this error is one of the timeout conditions
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. }
                | Self::ElementNotVisible { .. }
                | Self::TestTimeout { .. }
        )
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_classification() {
        let nav = E2eError::NavigationTimeout {
            url: "http://localhost/login".to_string(),
            ms: 30_000,
        };
        let elem = E2eError::ElementNotVisible {
            selector: "testid=user-menu".to_string(),
            ms: 10_000,
        };
        assert!(nav.is_timeout());
        assert!(elem.is_timeout());
        assert!(E2eError::TestTimeout { ms: 1 }.is_timeout());
        assert!(!E2eError::driver("boom").is_timeout());
    }

    #[test]
    fn test_display_messages() {
        let err = E2eError::ElementNotVisible {
            selector: "label=Email".to_string(),
            ms: 500,
        };
        assert_eq!(err.to_string(), "Element label=Email not visible after 500ms");

        let err = E2eError::config("NAVIGATION_TIMEOUT", "not a number");
        assert!(err.to_string().contains("NAVIGATION_TIMEOUT"));
    }
}
