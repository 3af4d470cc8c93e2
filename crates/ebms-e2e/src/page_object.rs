//! Page Object Model support.
//!
//! [`BasePage`] is the vocabulary shared by every screen: navigation with a
//! ready signal, element waits with deadlines, soft visibility checks, URL
//! validation and banner reads. Concrete screens embed a `BasePage` and
//! implement [`PageObject`] with their own locators and actions.

use crate::config::EnvConfig;
use crate::driver::{path_of, SharedPage};
use crate::locator::{Locator, Selector};
use crate::result::{E2eError, E2eResult};
use crate::wait::{poll_until, LoadState, WaitOptions};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Banner shown after a failed action
pub const ERROR_BANNER: &str = "toast-error";

/// Banner shown after a successful action
pub const SUCCESS_BANNER: &str = "toast-success";

/// Behaviour common to all screen wrappers.
///
/// Holds the shared page handle (borrowed from the test context, never
/// owned) and the run configuration. Cloning is cheap.
#[derive(Clone)]
pub struct BasePage {
    page: SharedPage,
    config: Arc<EnvConfig>,
}

impl std::fmt::Debug for BasePage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePage")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl BasePage {
    /// Wrap a page handle
    #[must_use]
    pub fn new(page: SharedPage, config: Arc<EnvConfig>) -> Self {
        Self { page, config }
    }

    /// Underlying page handle
    #[must_use]
    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Navigate to an application path, waiting for `DOMContentLoaded`
    pub async fn navigate_to(&self, path: &str) -> E2eResult<()> {
        self.navigate_to_with(path, LoadState::default()).await
    }

    /// Navigate to an application path, waiting for `state`.
    ///
    /// Fails with [`E2eError::NavigationTimeout`] after the configured
    /// navigation timeout.
    pub async fn navigate_to_with(&self, path: &str, state: LoadState) -> E2eResult<()> {
        let url = self.config.url_for(path);
        tracing::debug!(%url, %state, "navigating");
        self.page
            .goto(&url, state, self.config.navigation_timeout())
            .await
    }

    /// Wait until the element is visible, failing with
    /// [`E2eError::ElementNotVisible`] after `timeout`
    pub async fn wait_for_visible(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        let selector = locator.selector();
        let options = WaitOptions::new().with_timeout(timeout);
        let elapsed = poll_until(
            || self.page.is_visible(selector),
            &options,
            || E2eError::ElementNotVisible {
                selector: selector.to_string(),
                ms: options.timeout_ms(),
            },
        )
        .await?;
        tracing::trace!(%selector, ?elapsed, "element visible");
        Ok(())
    }

    /// Wait using the locator's own timeout, or the configured action timeout
    pub async fn wait_for(&self, locator: &Locator) -> E2eResult<()> {
        let timeout = locator
            .timeout()
            .unwrap_or_else(|| self.config.action_timeout());
        self.wait_for_visible(locator, timeout).await
    }

    /// Soft check: visible within the short soft timeout.
    ///
    /// A timeout becomes `false`; any other failure still propagates.
    pub async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        match self
            .wait_for_visible(locator, self.config.soft_timeout())
            .await
        {
            Ok(()) => Ok(true),
            Err(e) if e.is_timeout() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Current URL
    pub async fn current_url(&self) -> E2eResult<String> {
        self.page.current_url().await
    }

    /// Document title
    pub async fn page_title(&self) -> E2eResult<String> {
        self.page.title().await
    }

    /// Whether the current URL matches
    pub async fn url_matches(&self, pattern: &UrlPattern) -> E2eResult<bool> {
        Ok(pattern.matches(&self.current_url().await?))
    }

    /// Fail unless the current URL matches
    pub async fn validate_url_matches(&self, pattern: &UrlPattern) -> E2eResult<()> {
        let url = self.current_url().await?;
        if pattern.matches(&url) {
            Ok(())
        } else {
            Err(E2eError::assertion(format!(
                "URL '{url}' does not match {pattern}"
            )))
        }
    }

    /// Text of a banner if it shows up within the soft timeout, else `""`.
    /// Never fails.
    pub async fn banner_text(&self, locator: &Locator) -> String {
        match self.is_visible(locator).await {
            Ok(true) => match self.page.text_content(locator.selector()).await {
                Ok(text) => text.unwrap_or_default().trim().to_string(),
                Err(e) => {
                    tracing::debug!(%locator, error = %e, "banner text unreadable");
                    String::new()
                }
            },
            Ok(false) => String::new(),
            Err(e) => {
                tracing::debug!(%locator, error = %e, "banner check failed");
                String::new()
            }
        }
    }

    /// Error banner text or `""`
    pub async fn error_banner_text(&self) -> String {
        self.banner_text(&Locator::new(Selector::test_id(ERROR_BANNER)))
            .await
    }

    /// Success banner text or `""`
    pub async fn success_banner_text(&self) -> String {
        self.banner_text(&Locator::new(Selector::test_id(SUCCESS_BANNER)))
            .await
    }

    /// Wait for the element, then replace its value
    pub async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        self.wait_for(locator).await?;
        self.page.fill(locator.selector(), value).await
    }

    /// Wait for the element, then click it
    pub async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.wait_for(locator).await?;
        self.page.click(locator.selector()).await
    }

    /// Wait for the checkbox, then set its state
    pub async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()> {
        self.wait_for(locator).await?;
        self.page.set_checked(locator.selector(), checked).await
    }

    /// Wait for the select, then choose an option
    pub async fn select_option(&self, locator: &Locator, option: &str) -> E2eResult<()> {
        self.wait_for(locator).await?;
        self.page.select_option(locator.selector(), option).await
    }

    /// Wait for the element, then read its trimmed text
    pub async fn text_of(&self, locator: &Locator) -> E2eResult<String> {
        self.wait_for(locator).await?;
        Ok(self
            .page
            .text_content(locator.selector())
            .await?
            .unwrap_or_default()
            .trim()
            .to_string())
    }
}

/// Trait for page objects representing one logical screen.
///
/// # Example
///
/// ```ignore
/// struct ReportsPage {
///     base: BasePage,
///     export_button: Locator,
/// }
///
/// impl PageObject for ReportsPage {
///     const PATH: &'static str = "/admin/reports/";
///
///     fn create(base: BasePage) -> E2eResult<Self> {
///         Ok(Self {
///             base,
///             export_button: Locator::parse("role=button[name=\"Export\"]")?,
///         })
///     }
///
///     fn base(&self) -> &BasePage {
///         &self.base
///     }
///
///     fn ready_locator(&self) -> &Locator {
///         &self.export_button
///     }
/// }
/// ```
#[async_trait]
pub trait PageObject: Send + Sync + 'static {
    /// Application path of this screen (e.g. "/login", "/admin/users/")
    const PATH: &'static str;

    /// Build the screen wrapper; fails on malformed locators
    fn create(base: BasePage) -> E2eResult<Self>
    where
        Self: Sized;

    /// Shared base behaviour
    fn base(&self) -> &BasePage;

    /// Element whose visibility means the screen is ready
    fn ready_locator(&self) -> &Locator;

    /// Page name for logging
    fn page_name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("page")
    }

    /// Whether the current URL is this screen's path
    async fn is_current(&self) -> E2eResult<bool> {
        let url = self.base().current_url().await?;
        Ok(UrlMatcher::new(Self::PATH).matches(&path_of(&url)))
    }

    /// Soft check that the screen is ready
    async fn is_loaded(&self) -> E2eResult<bool> {
        self.base().is_visible(self.ready_locator()).await
    }

    /// Wait for the ready element
    async fn wait_until_loaded(&self) -> E2eResult<()> {
        self.base().wait_for(self.ready_locator()).await
    }

    /// Navigate to this screen and wait until it is ready
    async fn goto(&self) -> E2eResult<()> {
        tracing::info!(page = self.page_name(), path = Self::PATH, "opening page");
        self.base().navigate_to(Self::PATH).await?;
        self.wait_until_loaded().await
    }
}

/// URL expectation: literal substring or full pattern matching
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Exact URL match
    Exact(String),
    /// Prefix match
    Prefix(String),
    /// Contains substring
    Contains(String),
    /// Regular expression
    Regex(Regex),
    /// Glob pattern (e.g., "**/admin/users/*")
    Glob(String),
}

impl UrlPattern {
    /// Substring pattern
    #[must_use]
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    /// Compile a regular expression pattern
    pub fn regex(pattern: &str) -> E2eResult<Self> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| E2eError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// Check if a URL matches this pattern
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        match self {
            Self::Exact(pattern) => url == pattern,
            Self::Prefix(pattern) => url.starts_with(pattern.as_str()),
            Self::Contains(pattern) => url.contains(pattern.as_str()),
            Self::Regex(re) => re.is_match(url),
            Self::Glob(pattern) => glob_matches(pattern, url),
        }
    }
}

impl std::fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "exact '{p}'"),
            Self::Prefix(p) => write!(f, "prefix '{p}'"),
            Self::Contains(p) => write!(f, "substring '{p}'"),
            Self::Regex(re) => write!(f, "/{}/", re.as_str()),
            Self::Glob(p) => write!(f, "glob '{p}'"),
        }
    }
}

fn glob_matches(pattern: &str, url: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    let [first, middle @ .., last] = parts.as_slice() else {
        return url == pattern;
    };
    // Both ends are anchored; only the segments between them may float
    if url.len() < first.len() + last.len() || !url.starts_with(first) || !url.ends_with(last) {
        return false;
    }
    let mut rest = &url[first.len()..url.len() - last.len()];
    for part in middle.iter().filter(|p| !p.is_empty()) {
        match rest.find(part) {
            Some(found) => rest = &rest[found + part.len()..],
            None => return false,
        }
    }
    true
}

/// Route-style matcher for URL paths
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: String,
    segments: Vec<UrlSegment>,
}

#[derive(Debug, Clone)]
enum UrlSegment {
    Literal(String),
    Wildcard,
    Parameter(String),
}

impl UrlMatcher {
    /// Create a matcher.
    ///
    /// Patterns support:
    /// - Literal segments: `/login`
    /// - Wildcards: `/admin/users/*`
    /// - Named parameters: `/admin/users/:id/edit/`
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s == "*" {
                    UrlSegment::Wildcard
                } else if let Some(name) = s.strip_prefix(':') {
                    UrlSegment::Parameter(name.to_string())
                } else {
                    UrlSegment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            segments,
        }
    }

    /// Check if a path matches; trailing slashes are not significant
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        parts.len() == self.segments.len()
            && self
                .segments
                .iter()
                .zip(&parts)
                .all(|(segment, part)| match segment {
                    UrlSegment::Literal(lit) => lit == part,
                    UrlSegment::Wildcard | UrlSegment::Parameter(_) => true,
                })
    }

    /// Extract named parameters from a path
    #[must_use]
    pub fn extract_params(&self, path: &str) -> HashMap<String, String> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.segments
            .iter()
            .zip(parts)
            .filter_map(|(segment, part)| match segment {
                UrlSegment::Parameter(name) => Some((name.clone(), part.to_string())),
                _ => None,
            })
            .collect()
    }

    /// Get the original pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockElement, MockScreen};

    fn base_with(driver: Arc<MockDriver>) -> BasePage {
        let config = EnvConfig::default()
            .with_action_timeout(200)
            .with_soft_timeout(50)
            .with_navigation_timeout(200);
        BasePage::new(driver, Arc::new(config))
    }

    mod url_pattern_tests {
        use super::*;

        #[test]
        fn test_contains_and_exact() {
            let url = "http://localhost:8000/admin/users/";
            assert!(UrlPattern::contains("/admin/users").matches(url));
            assert!(!UrlPattern::contains("/login").matches(url));
            assert!(UrlPattern::Exact(url.to_string()).matches(url));
            assert!(UrlPattern::Prefix("http://localhost".to_string()).matches(url));
        }

        #[test]
        fn test_regex() {
            let pattern = UrlPattern::regex(r"dashboard|home|/$").unwrap();
            assert!(pattern.matches("http://localhost:8000/dashboard"));
            assert!(pattern.matches("http://localhost:8000/"));
            assert!(!pattern.matches("http://localhost:8000/login"));
        }

        #[test]
        fn test_invalid_regex() {
            assert!(matches!(
                UrlPattern::regex("(unclosed"),
                Err(E2eError::InvalidPattern { .. })
            ));
        }

        #[test]
        fn test_glob() {
            let pattern = UrlPattern::Glob("http://*/admin/users/*".to_string());
            assert!(pattern.matches("http://localhost/admin/users/create/"));
            assert!(!pattern.matches("http://localhost/admin/groups/"));
        }

        #[test]
        fn test_glob_anchors_last_segment_at_end() {
            let pattern = UrlPattern::Glob("*/users".to_string());
            assert!(pattern.matches("http://h/users/archive/users"));
            assert!(pattern.matches("http://h/users"));
            assert!(!pattern.matches("http://h/users/archive"));
        }

        #[test]
        fn test_glob_segments_do_not_overlap() {
            let pattern = UrlPattern::Glob("http://*/login".to_string());
            assert!(pattern.matches("http://localhost:8000/login"));
            assert!(!pattern.matches("http://localhost:8000/login/next"));
            assert!(!UrlPattern::Glob("ab*ba".to_string()).matches("aba"));
            assert!(UrlPattern::Glob("**/admin/*/edit".to_string()).matches("https://x/admin/users/edit"));
            assert!(UrlPattern::Glob("/login".to_string()).matches("/login"));
            assert!(!UrlPattern::Glob("/login".to_string()).matches("/login/"));
        }
    }

    mod url_matcher_tests {
        use super::*;

        #[test]
        fn test_literal_match() {
            let matcher = UrlMatcher::new("/admin/users/");
            assert!(matcher.matches("/admin/users/"));
            assert!(matcher.matches("/admin/users"));
            assert!(!matcher.matches("/admin/users/create/"));
        }

        #[test]
        fn test_wildcard_and_params() {
            let matcher = UrlMatcher::new("/admin/users/:id/edit");
            assert!(matcher.matches("/admin/users/42/edit"));
            assert!(!matcher.matches("/admin/users/edit"));
            let params = matcher.extract_params("/admin/users/42/edit");
            assert_eq!(params.get("id"), Some(&"42".to_string()));
            assert!(UrlMatcher::new("/admin/*").matches("/admin/users"));
        }

        #[test]
        fn test_root() {
            let matcher = UrlMatcher::new("/");
            assert!(matcher.matches("/"));
            assert!(!matcher.matches("/login"));
            assert_eq!(matcher.pattern(), "/");
        }
    }

    mod base_page_tests {
        use super::*;

        #[tokio::test]
        async fn test_navigate_to_uses_base_url() {
            let driver = MockDriver::default().shared();
            driver.route("/login", MockScreen::new("Sign in"));
            let base = base_with(Arc::clone(&driver));

            base.navigate_to("/login").await.unwrap();
            assert_eq!(base.current_url().await.unwrap(), "http://localhost:8000/login");
            assert_eq!(base.page_title().await.unwrap(), "Sign in");
            base.validate_url_matches(&UrlPattern::contains("/login"))
                .await
                .unwrap();
            assert!(base
                .validate_url_matches(&UrlPattern::contains("/dashboard"))
                .await
                .is_err());
        }

        #[tokio::test]
        async fn test_navigation_timeout() {
            let driver = MockDriver::default().shared();
            driver.fail_navigation("/login");
            let base = base_with(Arc::clone(&driver));
            let err = base.navigate_to("/login").await.unwrap_err();
            assert!(matches!(err, E2eError::NavigationTimeout { ms: 200, .. }));
        }

        #[tokio::test]
        async fn test_wait_for_visible_waits() {
            let driver = MockDriver::default().shared();
            let menu = Selector::test_id("user-menu");
            driver.show_after(&menu, MockElement::new(), Duration::from_millis(20));
            let base = base_with(Arc::clone(&driver));
            base.wait_for_visible(&Locator::new(menu), Duration::from_millis(500))
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_wait_for_visible_times_out() {
            let driver = MockDriver::default().shared();
            let base = base_with(Arc::clone(&driver));
            let err = base
                .wait_for_visible(
                    &Locator::new(Selector::test_id("missing")),
                    Duration::from_millis(30),
                )
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                E2eError::ElementNotVisible { ref selector, ms: 30 } if selector == "testid=missing"
            ));
        }

        #[tokio::test]
        async fn test_is_visible_is_soft() {
            let driver = MockDriver::default().shared();
            let present = Selector::label("Email");
            driver.show(&present, MockElement::new());
            driver.show(&Selector::label("Hidden"), MockElement::new().hidden());
            let base = base_with(Arc::clone(&driver));

            assert!(base.is_visible(&Locator::new(present)).await.unwrap());
            assert!(!base
                .is_visible(&Locator::new(Selector::label("Hidden")))
                .await
                .unwrap());
            assert!(!base
                .is_visible(&Locator::new(Selector::label("Absent")))
                .await
                .unwrap());
        }

        #[tokio::test]
        async fn test_banner_readers_never_fail() {
            let driver = MockDriver::default().shared();
            let base = base_with(Arc::clone(&driver));
            assert_eq!(base.error_banner_text().await, "");

            driver.show(
                &Selector::test_id(SUCCESS_BANNER),
                MockElement::with_text("  New User has been added  "),
            );
            assert_eq!(base.success_banner_text().await, "New User has been added");
        }

        #[tokio::test]
        async fn test_fill_waits_then_fills() {
            let driver = MockDriver::default().shared();
            let email = Selector::label("Email");
            driver.show_after(&email, MockElement::new(), Duration::from_millis(10));
            let base = base_with(Arc::clone(&driver));
            base.fill(&Locator::new(email.clone()), "a@b.com")
                .await
                .unwrap();
            assert_eq!(driver.with_state(|s| s.value_of(&email)), Some("a@b.com".to_string()));
        }

        #[tokio::test]
        async fn test_click_missing_element_times_out() {
            let driver = MockDriver::default().shared();
            let base = base_with(Arc::clone(&driver));
            let err = base
                .click(&Locator::new(Selector::role_named("button", "Save")))
                .await
                .unwrap_err();
            assert!(err.is_timeout());
        }
    }
}
