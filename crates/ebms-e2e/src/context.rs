//! Per-test context.
//!
//! Bundles the page handle, the configuration and a page-object cache for
//! exactly one test. Contexts are never shared between tests.

use crate::config::EnvConfig;
use crate::driver::{path_of, SharedPage};
use crate::factory::PageFactory;
use crate::page_object::{PageObject, UrlMatcher};
use crate::result::E2eResult;
use std::sync::Arc;
use uuid::Uuid;

/// State owned by one running test
pub struct TestContext {
    run_id: Uuid,
    page: SharedPage,
    config: Arc<EnvConfig>,
    factory: PageFactory,
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("run_id", &self.run_id)
            .field("base_url", &self.config.base_url)
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}

impl TestContext {
    /// Fresh context with an empty page-object cache
    #[must_use]
    pub fn new(page: SharedPage, config: Arc<EnvConfig>) -> Self {
        let run_id = Uuid::new_v4();
        tracing::debug!(%run_id, environment = %config.environment, "test context created");
        Self {
            run_id,
            page,
            config,
            factory: PageFactory::new(),
        }
    }

    /// Context configured from the process environment
    pub fn from_env(page: SharedPage) -> E2eResult<Self> {
        Ok(Self::new(page, Arc::new(EnvConfig::from_env()?)))
    }

    /// Unique id of this test run (for log correlation)
    #[must_use]
    pub const fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Shared page handle
    #[must_use]
    pub const fn shared_page(&self) -> &SharedPage {
        &self.page
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &Arc<EnvConfig> {
        &self.config
    }

    /// Page-object cache
    #[must_use]
    pub const fn factory(&self) -> &PageFactory {
        &self.factory
    }

    /// Tracing span tagged with the run id
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!("e2e_test", run_id = %self.run_id)
    }

    /// Start a new test body: empties the page-object cache
    pub fn begin_test(&mut self) {
        tracing::debug!(run_id = %self.run_id, "begin test");
        self.factory.clear();
    }

    /// Page object `P` for the current URL, from the cache when possible
    pub async fn page<P: PageObject>(&mut self) -> E2eResult<Arc<P>> {
        self.factory.get_or_create::<P>(&self.page, &self.config).await
    }

    /// Navigate to `P::PATH` unless already there, then return `P` once its
    /// ready element shows
    pub async fn open<P: PageObject>(&mut self) -> E2eResult<Arc<P>> {
        let current = path_of(&self.page.current_url().await?);
        if !UrlMatcher::new(P::PATH).matches(&current) {
            crate::auth::navigate(&self.page, &self.config, P::PATH).await?;
        }
        let page = self.page::<P>().await?;
        page.wait_until_loaded().await?;
        Ok(page)
    }
}
