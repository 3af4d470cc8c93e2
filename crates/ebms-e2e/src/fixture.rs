//! Fixture management.
//!
//! A fixture prepares a browser session (and optionally a ready page
//! object), hands it to the test body, and cleans up afterwards.
//! [`run_fixture`] is the scoped acquisition:
//!
//! ```text
//! Uninitialized ──► SettingUp ──► Ready ──► TearingDown ──► Terminal
//!                       │                       ▲
//!                       └── setup failed ───────┘
//! ```
//!
//! - A setup error aborts the test; the body never runs.
//! - Teardown runs after the body on every exit path, including panics.
//! - Teardown errors are logged at `warn` and never replace the body's result.

use crate::auth::{self, Credentials};
use crate::config::EnvConfig;
use crate::context::TestContext;
use crate::driver::SharedPage;
use crate::page_object::PageObject;
use crate::pages::{CreateUserPage, DashboardPage, LoginPage, UsersListPage};
use crate::result::{E2eError, E2eResult};
use async_trait::async_trait;
use futures::FutureExt;
use std::future::Future;
use std::marker::PhantomData;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Trait for fixtures that set up a value for one test and tear it down.
///
/// # Example
///
/// ```ignore
/// struct SeededUsers {
///     page: SharedPage,
///     config: Arc<EnvConfig>,
/// }
///
/// #[async_trait]
/// impl Fixture for SeededUsers {
///     type Value = Vec<UserRecord>;
///
///     async fn setup(&mut self) -> E2eResult<Self::Value> {
///         let users = TestDataGenerator::new().users(3, &UserOverrides::new());
///         // create them through the admin UI ...
///         Ok(users)
///     }
///
///     async fn teardown(&mut self) -> E2eResult<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Fixture: Send {
    /// Value handed to the test body
    type Value: Send;

    /// Prepare the value; an error aborts the test
    async fn setup(&mut self) -> E2eResult<Self::Value>;

    /// Release resources; errors are only logged
    async fn teardown(&mut self) -> E2eResult<()>;

    /// Fixture name for logging
    fn name(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Lifecycle state of a fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureState {
    /// Not yet requested
    Uninitialized,
    /// Setup in progress
    SettingUp,
    /// Value handed to the test body
    Ready,
    /// Teardown in progress
    TearingDown,
    /// Released; no further use
    Terminal,
}

impl FixtureState {
    /// Whether `next` may follow `self`
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uninitialized, Self::SettingUp)
                | (Self::SettingUp, Self::Ready | Self::TearingDown)
                | (Self::Ready, Self::TearingDown)
                | (Self::TearingDown, Self::Terminal)
        )
    }
}

/// Transition history of one fixture run
#[derive(Debug, Clone)]
pub struct FixtureLifecycle {
    name: &'static str,
    history: Vec<FixtureState>,
}

impl FixtureLifecycle {
    /// Fresh lifecycle in `Uninitialized`
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            history: vec![FixtureState::Uninitialized],
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> FixtureState {
        self.history
            .last()
            .copied()
            .unwrap_or(FixtureState::Uninitialized)
    }

    /// Every state visited, in order
    #[must_use]
    pub fn history(&self) -> &[FixtureState] {
        &self.history
    }

    /// Fixture name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Move to `next`, rejecting illegal transitions
    pub fn advance(&mut self, next: FixtureState) -> E2eResult<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(E2eError::Fixture {
                message: format!(
                    "fixture '{}' cannot move from {current:?} to {next:?}",
                    self.name
                ),
            });
        }
        tracing::debug!(fixture = self.name, from = ?current, to = ?next, "fixture transition");
        self.history.push(next);
        Ok(())
    }
}

/// Set up `fixture`, run `body` with its value, then tear down.
pub async fn run_fixture<F, B, Fut, T>(fixture: F, body: B) -> E2eResult<T>
where
    F: Fixture,
    B: FnOnce(F::Value) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let mut lifecycle = FixtureLifecycle::new(fixture.name());
    run_fixture_traced(fixture, &mut lifecycle, body).await
}

/// [`run_fixture`] recording transitions into `lifecycle`.
///
/// `lifecycle` must be fresh; a used one is rejected before setup starts.
pub async fn run_fixture_traced<F, B, Fut, T>(
    mut fixture: F,
    lifecycle: &mut FixtureLifecycle,
    body: B,
) -> E2eResult<T>
where
    F: Fixture,
    B: FnOnce(F::Value) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let name = fixture.name();
    lifecycle.advance(FixtureState::SettingUp)?;

    let value = match fixture.setup().await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(fixture = name, error = %e, "fixture setup failed");
            lifecycle.advance(FixtureState::TearingDown)?;
            teardown_logged(&mut fixture, name).await;
            lifecycle.advance(FixtureState::Terminal)?;
            return Err(e);
        }
    };

    lifecycle.advance(FixtureState::Ready)?;
    let outcome = AssertUnwindSafe(async move { body(value).await })
        .catch_unwind()
        .await;

    lifecycle.advance(FixtureState::TearingDown)?;
    teardown_logged(&mut fixture, name).await;
    lifecycle.advance(FixtureState::Terminal)?;

    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

async fn teardown_logged<F: Fixture>(fixture: &mut F, name: &'static str) {
    if let Err(e) = fixture.teardown().await {
        tracing::warn!(fixture = name, error = %e, "fixture teardown failed");
    }
}

// =============================================================================
// SESSION FIXTURES
// =============================================================================

/// Logged-in session for the given (default: configured) user
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    page: SharedPage,
    config: Arc<EnvConfig>,
    credentials: Credentials,
}

impl AuthenticatedSession {
    /// Session for the configured test user
    #[must_use]
    pub fn new(page: SharedPage, config: Arc<EnvConfig>) -> Self {
        let credentials = config.credentials.clone();
        Self {
            page,
            config,
            credentials,
        }
    }

    /// Log in as someone else
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

#[async_trait]
impl Fixture for AuthenticatedSession {
    type Value = TestContext;

    async fn setup(&mut self) -> E2eResult<TestContext> {
        auth::login(&self.page, &self.config, &self.credentials).await?;
        if !auth::is_authenticated(&self.page, self.config.action_timeout()).await? {
            let url = self.page.current_url().await.unwrap_or_default();
            return Err(E2eError::AuthenticationSetupFailed {
                message: format!(
                    "no signed-in indicator after logging in as {} (at {url})",
                    self.credentials.email
                ),
            });
        }
        let mut ctx = TestContext::new(Arc::clone(&self.page), Arc::clone(&self.config));
        ctx.begin_test();
        Ok(ctx)
    }

    async fn teardown(&mut self) -> E2eResult<()> {
        if !auth::logout(&self.page, &self.config).await? {
            tracing::debug!("session already ended before teardown");
        }
        Ok(())
    }
}

/// Signed-out session parked on the login screen
#[derive(Debug, Clone)]
pub struct UnauthenticatedSession {
    page: SharedPage,
    config: Arc<EnvConfig>,
}

impl UnauthenticatedSession {
    /// Create the fixture
    #[must_use]
    pub fn new(page: SharedPage, config: Arc<EnvConfig>) -> Self {
        Self { page, config }
    }
}

#[async_trait]
impl Fixture for UnauthenticatedSession {
    type Value = TestContext;

    async fn setup(&mut self) -> E2eResult<TestContext> {
        if let Err(e) = auth::logout(&self.page, &self.config).await {
            tracing::debug!(error = %e, "ignoring logout failure before unauthenticated test");
        }
        let mut ctx = TestContext::new(Arc::clone(&self.page), Arc::clone(&self.config));
        ctx.begin_test();
        let _ = ctx.open::<LoginPage>().await?;
        Ok(ctx)
    }

    async fn teardown(&mut self) -> E2eResult<()> {
        Ok(())
    }
}

// =============================================================================
// PAGE FIXTURES
// =============================================================================

/// Context plus a ready page object
#[derive(Debug)]
pub struct PageSession<P> {
    /// Test context (page handle, config, cache)
    pub context: TestContext,
    /// The ready screen
    pub page: Arc<P>,
}

/// Signed-out session with the login screen ready
#[derive(Debug, Clone)]
pub struct LoginPageFixture {
    session: UnauthenticatedSession,
}

impl LoginPageFixture {
    /// Create the fixture
    #[must_use]
    pub fn new(page: SharedPage, config: Arc<EnvConfig>) -> Self {
        Self {
            session: UnauthenticatedSession::new(page, config),
        }
    }
}

#[async_trait]
impl Fixture for LoginPageFixture {
    type Value = PageSession<LoginPage>;

    async fn setup(&mut self) -> E2eResult<Self::Value> {
        let mut context = self.session.setup().await?;
        let page = context.open::<LoginPage>().await?;
        Ok(PageSession { context, page })
    }

    async fn teardown(&mut self) -> E2eResult<()> {
        self.session.teardown().await
    }
}

/// Logged-in session with screen `P` open and ready
#[derive(Debug, Clone)]
pub struct AuthenticatedPage<P> {
    session: AuthenticatedSession,
    _page: PhantomData<fn() -> P>,
}

impl<P: PageObject> AuthenticatedPage<P> {
    /// Fixture for the configured test user
    #[must_use]
    pub fn new(page: SharedPage, config: Arc<EnvConfig>) -> Self {
        Self {
            session: AuthenticatedSession::new(page, config),
            _page: PhantomData,
        }
    }

    /// Log in as someone else
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.session = self.session.with_credentials(credentials);
        self
    }
}

#[async_trait]
impl<P: PageObject> Fixture for AuthenticatedPage<P> {
    type Value = PageSession<P>;

    async fn setup(&mut self) -> E2eResult<Self::Value> {
        let mut context = self.session.setup().await?;
        let page = context.open::<P>().await?;
        Ok(PageSession { context, page })
    }

    async fn teardown(&mut self) -> E2eResult<()> {
        self.session.teardown().await
    }

    fn name(&self) -> &'static str {
        let full = std::any::type_name::<P>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Logged in, dashboard signal visible
pub type DashboardPageFixture = AuthenticatedPage<DashboardPage>;

/// Logged in, users table open
pub type UsersPageFixture = AuthenticatedPage<UsersListPage>;

/// Logged in, create-user form open
pub type CreateUserPageFixture = AuthenticatedPage<CreateUserPage>;

// =============================================================================
// CONVENIENCE RUNNERS
// =============================================================================

/// Fixture values that carry a [`TestContext`]
trait Scoped {
    fn context(&self) -> &TestContext;
}

impl Scoped for TestContext {
    fn context(&self) -> &TestContext {
        self
    }
}

impl<P> Scoped for PageSession<P> {
    fn context(&self) -> &TestContext {
        &self.context
    }
}

/// [`run_fixture`] with the body inside the context's span and bounded by
/// `limit`; teardown still runs when the limit is hit
async fn run_scoped<F, B, Fut, T>(fixture: F, limit: Duration, body: B) -> E2eResult<T>
where
    F: Fixture,
    F::Value: Scoped,
    B: FnOnce(F::Value) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    run_fixture(fixture, move |value| {
        let span = value.context().span();
        within_test_timeout(limit, body(value)).instrument(span)
    })
    .await
}

async fn within_test_timeout<Fut, T>(limit: Duration, body: Fut) -> E2eResult<T>
where
    Fut: Future<Output = E2eResult<T>>,
{
    tokio::time::timeout(limit, body).await.unwrap_or_else(|_| {
        let ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        tracing::error!(ms, "test body timed out");
        Err(E2eError::TestTimeout { ms })
    })
}

/// Run `body` inside an [`AuthenticatedSession`]
pub async fn with_authenticated<B, Fut, T>(
    page: SharedPage,
    config: Arc<EnvConfig>,
    body: B,
) -> E2eResult<T>
where
    B: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let limit = config.test_timeout();
    run_scoped(AuthenticatedSession::new(page, config), limit, body).await
}

/// Run `body` inside an [`UnauthenticatedSession`]
pub async fn with_unauthenticated<B, Fut, T>(
    page: SharedPage,
    config: Arc<EnvConfig>,
    body: B,
) -> E2eResult<T>
where
    B: FnOnce(TestContext) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let limit = config.test_timeout();
    run_scoped(UnauthenticatedSession::new(page, config), limit, body).await
}

/// Run `body` with the login screen ready
pub async fn with_login_page<B, Fut, T>(
    page: SharedPage,
    config: Arc<EnvConfig>,
    body: B,
) -> E2eResult<T>
where
    B: FnOnce(PageSession<LoginPage>) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let limit = config.test_timeout();
    run_scoped(LoginPageFixture::new(page, config), limit, body).await
}

/// Run `body` with the dashboard ready
pub async fn with_dashboard_page<B, Fut, T>(
    page: SharedPage,
    config: Arc<EnvConfig>,
    body: B,
) -> E2eResult<T>
where
    B: FnOnce(PageSession<DashboardPage>) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let limit = config.test_timeout();
    run_scoped(DashboardPageFixture::new(page, config), limit, body).await
}

/// Run `body` with the users table ready
pub async fn with_users_page<B, Fut, T>(
    page: SharedPage,
    config: Arc<EnvConfig>,
    body: B,
) -> E2eResult<T>
where
    B: FnOnce(PageSession<UsersListPage>) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let limit = config.test_timeout();
    run_scoped(UsersPageFixture::new(page, config), limit, body).await
}

/// Run `body` with the create-user form ready
pub async fn with_create_user_page<B, Fut, T>(
    page: SharedPage,
    config: Arc<EnvConfig>,
    body: B,
) -> E2eResult<T>
where
    B: FnOnce(PageSession<CreateUserPage>) -> Fut,
    Fut: Future<Output = E2eResult<T>>,
{
    let limit = config.test_timeout();
    run_scoped(CreateUserPageFixture::new(page, config), limit, body).await
}
