//! EBMS end-to-end suite: Page Object Model over an abstract browser page.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      EBMS E2E Architecture                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Test spec  │    │ Fixtures   │    │ Page       │            │
//! │   │ (tests/)   │───►│ + context  │───►│ objects    │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                      ┌──────────────────────────────┐           │
//! │                      │ PageDriver (CDP / in-memory) │           │
//! │                      └──────────────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use ebms_e2e::prelude::*;
//!
//! #[tokio::test]
//! async fn login_lands_on_dashboard() -> E2eResult<()> {
//!     let browser = ChromiumBrowser::launch(&LaunchOptions::default()).await?;
//!     let page = browser.new_page().await?;
//!     let config = Arc::new(EnvConfig::from_env()?);
//!
//!     with_dashboard_page(page, config, |session| async move {
//!         assert!(session.page.is_authenticated().await?);
//!         Ok(())
//!     })
//!     .await
//! }
//! ```

#![warn(missing_docs)]

pub mod auth;
#[cfg(feature = "browser")]
pub mod cdp;
pub mod config;
pub mod context;
pub mod data;
pub mod driver;
pub mod factory;
pub mod fixture;
pub mod locator;
pub mod logging;
pub mod page_object;
pub mod pages;
mod result;
pub mod wait;

pub use auth::Credentials;
#[cfg(feature = "browser")]
pub use cdp::{CdpDriver, ChromiumBrowser, LaunchOptions};
pub use config::{EnvConfig, Environment};
pub use context::TestContext;
pub use data::{TestDataGenerator, UserOverrides, UserRecord};
pub use driver::{
    Cookie, MockDriver, MockElement, MockScreen, MockState, PageDriver, SharedPage, StorageState,
};
pub use factory::{CacheKey, PageFactory};
pub use fixture::{
    run_fixture, run_fixture_traced, with_authenticated, with_create_user_page,
    with_dashboard_page, with_login_page, with_unauthenticated, with_users_page,
    AuthenticatedPage, AuthenticatedSession, CreateUserPageFixture, DashboardPageFixture, Fixture,
    FixtureLifecycle, FixtureState, LoginPageFixture, PageSession, UnauthenticatedSession,
    UsersPageFixture,
};
pub use locator::{Locator, Selector};
pub use logging::{init_tracing, LogFormat};
pub use page_object::{BasePage, PageObject, UrlMatcher, UrlPattern};
pub use pages::{CreateUserPage, DashboardPage, LoginPage, UsersListPage, USER_ADDED_MESSAGE};
pub use result::{E2eError, E2eResult};
pub use wait::{poll_until, LoadState, WaitOptions};

/// Everything a spec file needs
pub mod prelude {
    pub use super::*;
    pub use std::sync::Arc;
}
