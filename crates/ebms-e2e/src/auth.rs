//! Authentication and navigation helpers.
//!
//! These work directly against a [`SharedPage`], without the page-object
//! layer. Fixtures use them for session setup and teardown.

use crate::config::EnvConfig;
use crate::driver::{PageDriver, SharedPage, StorageState};
use crate::locator::Selector;
use crate::result::{E2eError, E2eResult};
use crate::wait::{poll_until, LoadState, WaitOptions};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Login screen path
pub const LOGIN_PATH: &str = "/login";

/// Test ID of the element shown only to signed-in users
pub const USER_MENU_TEST_ID: &str = "user-menu";

/// Login email and password.
///
/// The password is never printed by `Debug` and never serialised.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Login password
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Selectors the helpers rely on
pub(crate) mod selectors {
    use super::USER_MENU_TEST_ID;
    use crate::locator::Selector;

    pub fn email_field() -> Selector {
        Selector::label("Email")
    }

    pub fn password_field() -> Selector {
        Selector::label("Password")
    }

    pub fn login_button() -> Selector {
        Selector::role_named("button", "Login")
    }

    pub fn logout_button() -> Selector {
        Selector::role_named("button", "Logout")
    }

    pub fn user_menu() -> Selector {
        Selector::test_id(USER_MENU_TEST_ID)
    }
}

async fn wait_visible(page: &dyn PageDriver, selector: &Selector, timeout: Duration) -> E2eResult<()> {
    let options = WaitOptions::new().with_timeout(timeout);
    poll_until(
        || page.is_visible(selector),
        &options,
        || E2eError::ElementNotVisible {
            selector: selector.to_string(),
            ms: options.timeout_ms(),
        },
    )
    .await
    .map(|_| ())
}

async fn soft_visible(page: &dyn PageDriver, selector: &Selector, timeout: Duration) -> E2eResult<bool> {
    match wait_visible(page, selector, timeout).await {
        Ok(()) => Ok(true),
        Err(e) if e.is_timeout() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Load an application path and wait for `DOMContentLoaded`
pub async fn navigate(page: &SharedPage, config: &EnvConfig, path: &str) -> E2eResult<()> {
    let url = config.url_for(path);
    tracing::debug!(%url, "navigate");
    page.goto(&url, LoadState::default(), config.navigation_timeout())
        .await
}

/// Open the login screen and submit `credentials`.
///
/// Does not check the outcome; use [`is_authenticated`] for that.
pub async fn login(page: &SharedPage, config: &EnvConfig, credentials: &Credentials) -> E2eResult<()> {
    tracing::info!(email = %credentials.email, "logging in");
    navigate(page, config, LOGIN_PATH).await?;

    let email = selectors::email_field();
    wait_visible(page.as_ref(), &email, config.action_timeout()).await?;
    page.fill(&email, &credentials.email).await?;
    page.fill(&selectors::password_field(), &credentials.password)
        .await?;
    page.click(&selectors::login_button()).await
}

/// Log in with the configured administrator account
pub async fn login_as_admin(page: &SharedPage, config: &EnvConfig) -> E2eResult<()> {
    login(page, config, &config.admin_credentials).await
}

/// Best-effort logout.
///
/// Returns `true` when a logout control was found and clicked, `false`
/// when there was no session to end.
pub async fn logout(page: &SharedPage, config: &EnvConfig) -> E2eResult<bool> {
    let soft = config.soft_timeout();
    let logout_button = selectors::logout_button();

    if !soft_visible(page.as_ref(), &logout_button, soft).await? {
        // The button may sit behind the user menu
        let menu = selectors::user_menu();
        if !soft_visible(page.as_ref(), &menu, soft).await? {
            tracing::debug!("no session to log out of");
            return Ok(false);
        }
        page.click(&menu).await?;
        if !soft_visible(page.as_ref(), &logout_button, soft).await? {
            return Ok(false);
        }
    }

    page.click(&logout_button).await?;
    tracing::info!("logged out");
    Ok(true)
}

/// Whether the post-login signal shows up within `timeout`
pub async fn is_authenticated(page: &SharedPage, timeout: Duration) -> E2eResult<bool> {
    soft_visible(page.as_ref(), &selectors::user_menu(), timeout).await
}

/// Export cookies to a storage-state JSON file
pub async fn save_storage_state(page: &SharedPage, path: impl AsRef<Path>) -> E2eResult<StorageState> {
    let state = page.storage_state().await?;
    state.save(path.as_ref())?;
    tracing::debug!(path = %path.as_ref().display(), cookies = state.cookies.len(), "saved storage state");
    Ok(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::driver::{Cookie, MockDriver, MockElement, MockScreen};
    use std::sync::Arc;

    fn config() -> EnvConfig {
        EnvConfig::default()
            .with_soft_timeout(30)
            .with_action_timeout(200)
            .with_navigation_timeout(200)
    }

    fn app() -> Arc<MockDriver> {
        let driver = MockDriver::default().shared();
        driver.route(
            "/login",
            MockScreen::new("Login")
                .with(&selectors::email_field(), MockElement::new())
                .with(&selectors::password_field(), MockElement::new())
                .with(&selectors::login_button(), MockElement::new()),
        );
        driver.route(
            "/dashboard",
            MockScreen::new("Dashboard")
                .with(&selectors::user_menu(), MockElement::with_text("user"))
                .with(&selectors::logout_button(), MockElement::new()),
        );
        driver.on_click(&selectors::login_button(), |state| {
            let ok = state.value_of(&selectors::email_field()).as_deref() == Some("user@example.com")
                && state.value_of(&selectors::password_field()).as_deref() == Some("secret123");
            if ok {
                let domain = state.domain();
                state.set_cookie(Cookie::session("sessionid", "s1", domain));
                state.navigate("/dashboard");
            }
        });
        driver.on_click(&selectors::logout_button(), |state| {
            state.clear_cookie("sessionid");
            state.navigate("/login");
        });
        driver
    }

    mod credentials_tests {
        use super::*;

        #[test]
        fn test_debug_redacts_password() {
            let creds = Credentials::new("a@b.com", "hunter2");
            let printed = format!("{creds:?}");
            assert!(printed.contains("a@b.com"));
            assert!(!printed.contains("hunter2"));
        }

        #[test]
        fn test_password_not_serialised() {
            let json = serde_json::to_string(&Credentials::new("a@b.com", "hunter2")).unwrap();
            assert!(!json.contains("hunter2"));
            let back: Credentials = serde_json::from_str(&json).unwrap();
            assert_eq!(back.email, "a@b.com");
            assert!(back.password.is_empty());
        }
    }

    mod session_tests {
        use super::*;

        #[tokio::test]
        async fn test_login_then_logout() {
            let driver = app();
            let page: SharedPage = driver.clone();
            let config = config();

            login(&page, &config, &config.credentials).await.unwrap();
            assert!(is_authenticated(&page, Duration::from_millis(50)).await.unwrap());
            assert!(page.current_url().await.unwrap().ends_with("/dashboard"));

            assert!(logout(&page, &config).await.unwrap());
            assert!(!is_authenticated(&page, Duration::from_millis(20)).await.unwrap());
        }

        #[tokio::test]
        async fn test_bad_password_stays_on_login() {
            let driver = app();
            let page: SharedPage = driver.clone();
            let config = config();

            login(&page, &config, &Credentials::new("user@example.com", "nope"))
                .await
                .unwrap();
            assert!(!is_authenticated(&page, Duration::from_millis(20)).await.unwrap());
            assert!(page.current_url().await.unwrap().ends_with("/login"));
        }

        #[tokio::test]
        async fn test_logout_without_session_is_noop() {
            let driver = app();
            let page: SharedPage = driver.clone();
            navigate(&page, &config(), "/login").await.unwrap();
            assert!(!logout(&page, &config()).await.unwrap());
            assert!(!driver.was_called("click"));
        }

        #[tokio::test]
        async fn test_login_missing_form_times_out() {
            let driver = MockDriver::default().shared();
            let page: SharedPage = driver.clone();
            let err = login(&page, &config(), &config().credentials)
                .await
                .unwrap_err();
            assert!(matches!(err, E2eError::ElementNotVisible { .. }));
        }

        #[tokio::test]
        async fn test_save_storage_state() {
            let driver = app();
            let page: SharedPage = driver.clone();
            let config = config();
            login(&page, &config, &config.credentials).await.unwrap();

            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("user.json");
            let state = save_storage_state(&page, &path).await.unwrap();
            assert!(state.cookie("sessionid").is_some());
            assert_eq!(StorageState::load(&path).unwrap(), state);
        }
    }
}
