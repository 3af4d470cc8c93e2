//! Page-object cache.
//!
//! Memoizes page objects by (type, URL at creation time). A hit returns the
//! same `Arc` that was handed out before.
//!
//! Keys are never re-derived: after the page navigates, a cached object is
//! still returned for its original URL, and a lookup at the new URL creates
//! a second entry. Old entries stay until [`PageFactory::clear`]. Call it at
//! the start of every test (`TestContext::begin_test` does).
//!
//! The cache is not synchronised. Each test context owns its own factory.

use crate::config::EnvConfig;
use crate::driver::SharedPage;
use crate::page_object::{BasePage, PageObject};
use crate::result::E2eResult;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Cache entry key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    type_id: TypeId,
    type_name: &'static str,
    url: String,
}

impl CacheKey {
    /// Key for page object type `P` at `url`
    #[must_use]
    pub fn of<P: PageObject>(url: impl Into<String>) -> Self {
        let full = std::any::type_name::<P>();
        Self {
            type_id: TypeId::of::<P>(),
            type_name: full.rsplit("::").next().unwrap_or(full),
            url: url.into(),
        }
    }

    /// Short type name
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// URL at creation time
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.type_name, self.url)
    }
}

/// Page-object cache owned by one test context
#[derive(Default)]
pub struct PageFactory {
    entries: HashMap<CacheKey, Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for PageFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFactory")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl PageFactory {
    /// Empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached `P` for the page's current URL, creating it on a miss.
    ///
    /// Constructor errors propagate unchanged and nothing is cached.
    pub async fn get_or_create<P: PageObject>(
        &mut self,
        page: &SharedPage,
        config: &Arc<EnvConfig>,
    ) -> E2eResult<Arc<P>> {
        let key = CacheKey::of::<P>(page.current_url().await?);

        if let Some(entry) = self.entries.get(&key) {
            if let Ok(cached) = Arc::clone(entry).downcast::<P>() {
                tracing::trace!(%key, "page object cache hit");
                return Ok(cached);
            }
        }

        let created = Arc::new(P::create(BasePage::new(
            Arc::clone(page),
            Arc::clone(config),
        ))?);
        tracing::debug!(%key, "page object created");
        let _ = self.entries.insert(key, Arc::clone(&created) as Arc<dyn Any + Send + Sync>);
        Ok(created)
    }

    /// Whether `P` is cached for `url`
    #[must_use]
    pub fn contains<P: PageObject>(&self, url: &str) -> bool {
        self.entries.contains_key(&CacheKey::of::<P>(url))
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(entries = self.entries.len(), "clearing page object cache");
        }
        self.entries.clear();
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached keys
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }
}
