//! PageDriver - abstract browser page.
//!
//! Page objects never talk to a browser engine directly. They hold a
//! [`SharedPage`] and go through this trait, so the same screens run against
//! Chromium (`cdp::CdpDriver`, feature `browser`) or against [`MockDriver`].
//!
//! ```text
//! ┌────────────────────┐   ┌─────────────────────┐
//! │ page objects       │   │ auth helpers        │
//! └─────────┬──────────┘   └──────────┬──────────┘
//!           └─────────┬───────────────┘
//!              SharedPage = Arc<dyn PageDriver>
//!           ┌─────────┴───────────┐
//!   ┌───────┴───────┐     ┌───────┴───────┐
//!   │ CdpDriver     │     │ MockDriver    │
//!   │ chromiumoxide │     │ in-memory     │
//!   └───────────────┘     └───────────────┘
//! ```
//!
//! Queries (`is_visible`, `text_content`, ...) answer immediately. Waiting is
//! layered on top by `page_object::BasePage`.

use crate::locator::Selector;
use crate::result::{E2eError, E2eResult};
use crate::wait::LoadState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Shared, non-owned page handle
pub type SharedPage = Arc<dyn PageDriver>;

/// Browser cookie (Playwright storage-state shape)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain
    pub domain: String,
    /// Path
    pub path: String,
    /// Expiry (unix seconds, -1 for session cookies)
    pub expires: f64,
    /// HTTP-only flag
    pub http_only: bool,
    /// Secure flag
    pub secure: bool,
}

impl Cookie {
    /// Create a session cookie for a domain
    #[must_use]
    pub fn session(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: "/".to_string(),
            expires: -1.0,
            http_only: true,
            secure: false,
        }
    }
}

/// Exported authentication state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    /// Cookies for every origin
    pub cookies: Vec<Cookie>,
}

impl StorageState {
    /// Write as JSON
    pub fn save(&self, path: impl AsRef<Path>) -> E2eResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read from JSON
    pub fn load(path: impl AsRef<Path>) -> E2eResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Find a cookie by name
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }
}

/// Abstract browser page.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait for `wait_until`, failing with
    /// [`E2eError::NavigationTimeout`] after `timeout`
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> E2eResult<()>;

    /// Current URL
    async fn current_url(&self) -> E2eResult<String>;

    /// Document title
    async fn title(&self) -> E2eResult<String>;

    /// Whether the first match is rendered and visible
    async fn is_visible(&self, selector: &Selector) -> E2eResult<bool>;

    /// Whether the first match is enabled
    async fn is_enabled(&self, selector: &Selector) -> E2eResult<bool>;

    /// Whether the first match is checked
    async fn is_checked(&self, selector: &Selector) -> E2eResult<bool>;

    /// Text content of the first match
    async fn text_content(&self, selector: &Selector) -> E2eResult<Option<String>>;

    /// Value of the first matching form control
    async fn input_value(&self, selector: &Selector) -> E2eResult<String>;

    /// Number of matches
    async fn count(&self, selector: &Selector) -> E2eResult<usize>;

    /// Replace the value of a form control
    async fn fill(&self, selector: &Selector, value: &str) -> E2eResult<()>;

    /// Click the first match
    async fn click(&self, selector: &Selector) -> E2eResult<()>;

    /// Check or uncheck a checkbox
    async fn set_checked(&self, selector: &Selector, checked: bool) -> E2eResult<()>;

    /// Select an option of a `<select>` by value or label
    async fn select_option(&self, selector: &Selector, option: &str) -> E2eResult<()>;

    /// Export cookies
    async fn storage_state(&self) -> E2eResult<StorageState>;

    /// Close the page
    async fn close(&self) -> E2eResult<()>;
}

impl std::fmt::Debug for dyn PageDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PageDriver")
    }
}

// =============================================================================
// MOCK DRIVER
// =============================================================================

/// Element state in a [`MockDriver`] document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Rendered and visible
    pub visible: bool,
    /// Enabled for interaction
    pub enabled: bool,
    /// Checkbox state
    pub checked: bool,
    /// Text content
    pub text: String,
    /// Form value
    pub value: String,
    /// Allowed values for a select
    pub options: Vec<String>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            visible: true,
            enabled: true,
            checked: false,
            text: String::new(),
            value: String::new(),
            options: Vec::new(),
        }
    }
}

impl MockElement {
    /// Visible, enabled element
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Element with text content
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Select with allowed values
    #[must_use]
    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Mark hidden
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A route's document in a [`MockDriver`]
#[derive(Debug, Clone, Default)]
pub struct MockScreen {
    /// Document title
    pub title: String,
    /// Elements keyed by selector text
    pub elements: Vec<(String, MockElement)>,
}

impl MockScreen {
    /// Screen with a title
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            elements: Vec::new(),
        }
    }

    /// Add an element
    #[must_use]
    pub fn with(mut self, selector: &Selector, element: MockElement) -> Self {
        self.elements.push((selector.to_string(), element));
        self
    }
}

/// Click reaction in a [`MockDriver`]
pub type ClickHandler = Arc<dyn Fn(&mut MockState) + Send + Sync>;

/// Runs before a route loads; may return a redirect path
pub type NavigationGuard = Arc<dyn Fn(&MockState, &str) -> Option<String> + Send + Sync>;

/// Runs after a route's screen is loaded
pub type LoadHook = Arc<dyn Fn(&mut MockState, &str) + Send + Sync>;

/// Mutable state of a [`MockDriver`], handed to click handlers and hooks
pub struct MockState {
    origin: String,
    url: String,
    title: String,
    elements: Vec<(String, MockElement)>,
    delayed: Vec<(Instant, String, MockElement)>,
    routes: Vec<(String, MockScreen)>,
    click_handlers: Vec<(String, ClickHandler)>,
    guard: Option<NavigationGuard>,
    load_hook: Option<LoadHook>,
    cookies: Vec<Cookie>,
    failing_paths: HashSet<String>,
    latency: Duration,
    history: Vec<String>,
    records: Vec<String>,
}

impl std::fmt::Debug for MockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockState")
            .field("url", &self.url)
            .field("title", &self.title)
            .field("elements", &self.elements.len())
            .field("routes", &self.routes.len())
            .field("cookies", &self.cookies.len())
            .finish_non_exhaustive()
    }
}

impl MockState {
    fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            url: "about:blank".to_string(),
            title: String::new(),
            elements: Vec::new(),
            delayed: Vec::new(),
            routes: Vec::new(),
            click_handlers: Vec::new(),
            guard: None,
            load_hook: None,
            cookies: Vec::new(),
            failing_paths: HashSet::new(),
            latency: Duration::ZERO,
            history: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path component of the current URL
    #[must_use]
    pub fn path(&self) -> String {
        path_of(&self.url)
    }

    /// Load a route by path (guards and load hooks apply)
    pub fn navigate(&mut self, path: &str) {
        let mut target = path_of(path);
        if let Some(guard) = self.guard.clone() {
            if let Some(redirect) = guard(self, &target) {
                target = path_of(&redirect);
            }
        }
        self.url = format!("{}{}", self.origin, target);
        self.delayed.clear();
        match self.routes.iter().find(|(p, _)| *p == target) {
            Some((_, screen)) => {
                self.title = screen.title.clone();
                self.elements = screen.elements.clone();
            }
            None => {
                self.title = "Not Found".to_string();
                self.elements = Vec::new();
            }
        }
        if let Some(hook) = self.load_hook.clone() {
            hook(self, &target);
        }
    }

    /// Add or replace an element in the current document
    pub fn show(&mut self, selector: &Selector, element: MockElement) {
        let key = selector.to_string();
        self.elements.retain(|(k, _)| *k != key);
        self.elements.push((key, element));
    }

    /// Append an element, keeping existing matches (e.g. table rows)
    pub fn append(&mut self, selector: &Selector, element: MockElement) {
        self.elements.push((selector.to_string(), element));
    }

    /// Remove every element with this selector
    pub fn remove(&mut self, selector: &Selector) {
        let key = selector.to_string();
        self.elements.retain(|(k, _)| *k != key);
    }

    /// Form value of an element in the current document
    #[must_use]
    pub fn value_of(&self, selector: &Selector) -> Option<String> {
        self.find(selector).map(|e| e.value.clone())
    }

    /// Set a cookie (replacing one with the same name)
    pub fn set_cookie(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    /// Remove a cookie by name
    pub fn clear_cookie(&mut self, name: &str) {
        self.cookies.retain(|c| c.name != name);
    }

    /// Whether a cookie is set
    #[must_use]
    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.iter().any(|c| c.name == name)
    }

    /// Domain of the origin
    #[must_use]
    pub fn domain(&self) -> String {
        let host = self
            .origin
            .split_once("://")
            .map_or(self.origin.as_str(), |(_, rest)| rest);
        host.split(':').next().unwrap_or(host).to_string()
    }

    /// Application records kept across navigations (e.g. created users)
    #[must_use]
    pub fn records(&self) -> &[String] {
        &self.records
    }

    /// Store an application record
    pub fn push_record(&mut self, record: impl Into<String>) {
        self.records.push(record.into());
    }

    fn settle(&mut self) {
        let now = Instant::now();
        let (ready, pending): (Vec<_>, Vec<_>) =
            self.delayed.drain(..).partition(|(at, _, _)| *at <= now);
        self.delayed = pending;
        for (_, key, element) in ready {
            self.elements.retain(|(k, _)| *k != key);
            self.elements.push((key, element));
        }
    }

    fn matches(key: &str, element: &MockElement, selector: &Selector) -> bool {
        match selector {
            Selector::Text(t) => element.text.contains(t.as_str()),
            other => key == other.to_string(),
        }
    }

    fn find(&self, selector: &Selector) -> Option<&MockElement> {
        self.elements
            .iter()
            .find(|(k, e)| Self::matches(k, e, selector))
            .map(|(_, e)| e)
    }

    fn find_mut(&mut self, selector: &Selector) -> Option<&mut MockElement> {
        self.elements
            .iter_mut()
            .find(|(k, e)| Self::matches(k, e, selector))
            .map(|(_, e)| e)
    }

    fn actionable(&mut self, selector: &Selector) -> E2eResult<&mut MockElement> {
        let element = self.find_mut(selector).ok_or_else(|| E2eError::Element {
            selector: selector.to_string(),
            message: "no element matches".to_string(),
        })?;
        if !element.visible || !element.enabled {
            return Err(E2eError::Element {
                selector: selector.to_string(),
                message: "element is not visible and enabled".to_string(),
            });
        }
        Ok(element)
    }
}

pub(crate) fn path_of(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| {
        rest.find('/').map_or("", |i| &rest[i..])
    });
    let path = rest.split(['?', '#']).next().unwrap_or("");
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

/// Scriptable in-memory page for unit and integration tests
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver")
            .field("state", &*self.lock())
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}

impl MockDriver {
    /// Create a driver serving routes under `origin`
    #[must_use]
    pub fn new(origin: &str) -> Self {
        Self {
            state: Mutex::new(MockState::new(origin)),
        }
    }

    /// Wrap into a shared page handle
    #[must_use]
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means a test handler panicked; the state is still usable
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a route
    pub fn route(&self, path: &str, screen: MockScreen) {
        let mut state = self.lock();
        let path = path_of(path);
        state.routes.retain(|(p, _)| *p != path);
        state.routes.push((path, screen));
    }

    /// React to clicks on a selector
    pub fn on_click<F>(&self, selector: &Selector, handler: F)
    where
        F: Fn(&mut MockState) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let key = selector.to_string();
        state.click_handlers.retain(|(k, _)| *k != key);
        state.click_handlers.push((key, Arc::new(handler)));
    }

    /// Decide redirects before a route loads
    pub fn guard<F>(&self, guard: F)
    where
        F: Fn(&MockState, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.lock().guard = Some(Arc::new(guard));
    }

    /// Populate dynamic content after a route loads
    pub fn on_load<F>(&self, hook: F)
    where
        F: Fn(&mut MockState, &str) + Send + Sync + 'static,
    {
        self.lock().load_hook = Some(Arc::new(hook));
    }

    /// Make navigations to a path never reach their ready signal
    pub fn fail_navigation(&self, path: &str) {
        let _ = self.lock().failing_paths.insert(path_of(path));
    }

    /// Simulated navigation latency
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    /// Add or replace an element in the current document
    pub fn show(&self, selector: &Selector, element: MockElement) {
        self.lock().show(selector, element);
    }

    /// Add an element once `delay` has elapsed
    pub fn show_after(&self, selector: &Selector, element: MockElement, delay: Duration) {
        self.lock()
            .delayed
            .push((Instant::now() + delay, selector.to_string(), element));
    }

    /// Remove an element from the current document
    pub fn remove(&self, selector: &Selector) {
        self.lock().remove(selector);
    }

    /// Run a closure against the state
    pub fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut *self.lock())
    }

    /// Call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a call was recorded
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(method))
    }

    fn record(&self, call: String) {
        self.lock().history.push(call);
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> E2eResult<()> {
        self.record(format!("goto:{url}"));
        let (latency, failing) = {
            let state = self.lock();
            (state.latency, state.failing_paths.contains(&path_of(url)))
        };
        if failing || latency > timeout {
            tokio::time::sleep(timeout).await;
            return Err(E2eError::NavigationTimeout {
                url: url.to_string(),
                ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            });
        }
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        tracing::trace!(url, %wait_until, "mock navigation");
        self.lock().navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.lock().title.clone())
    }

    async fn is_visible(&self, selector: &Selector) -> E2eResult<bool> {
        let mut state = self.lock();
        state.settle();
        Ok(state.find(selector).is_some_and(|e| e.visible))
    }

    async fn is_enabled(&self, selector: &Selector) -> E2eResult<bool> {
        let mut state = self.lock();
        state.settle();
        Ok(state.find(selector).is_some_and(|e| e.enabled))
    }

    async fn is_checked(&self, selector: &Selector) -> E2eResult<bool> {
        let mut state = self.lock();
        state.settle();
        Ok(state.find(selector).is_some_and(|e| e.checked))
    }

    async fn text_content(&self, selector: &Selector) -> E2eResult<Option<String>> {
        let mut state = self.lock();
        state.settle();
        Ok(state.find(selector).map(|e| e.text.clone()))
    }

    async fn input_value(&self, selector: &Selector) -> E2eResult<String> {
        let mut state = self.lock();
        state.settle();
        state
            .find(selector)
            .map(|e| e.value.clone())
            .ok_or_else(|| E2eError::Element {
                selector: selector.to_string(),
                message: "no element matches".to_string(),
            })
    }

    async fn count(&self, selector: &Selector) -> E2eResult<usize> {
        let mut state = self.lock();
        state.settle();
        Ok(state
            .elements
            .iter()
            .filter(|(k, e)| MockState::matches(k, e, selector))
            .count())
    }

    async fn fill(&self, selector: &Selector, value: &str) -> E2eResult<()> {
        self.record(format!("fill:{selector}"));
        let mut state = self.lock();
        state.settle();
        state.actionable(selector)?.value = value.to_string();
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> E2eResult<()> {
        self.record(format!("click:{selector}"));
        let mut state = self.lock();
        state.settle();
        let _ = state.actionable(selector)?;
        let key = selector.to_string();
        let handler = state
            .click_handlers
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, h)| Arc::clone(h));
        if let Some(handler) = handler {
            handler(&mut *state);
        }
        Ok(())
    }

    async fn set_checked(&self, selector: &Selector, checked: bool) -> E2eResult<()> {
        self.record(format!("check:{selector}={checked}"));
        let mut state = self.lock();
        state.settle();
        state.actionable(selector)?.checked = checked;
        Ok(())
    }

    async fn select_option(&self, selector: &Selector, option: &str) -> E2eResult<()> {
        self.record(format!("select:{selector}={option}"));
        let mut state = self.lock();
        state.settle();
        let element = state.actionable(selector)?;
        if !element.options.is_empty() && !element.options.iter().any(|o| o == option) {
            return Err(E2eError::Element {
                selector: selector.to_string(),
                message: format!("no option '{option}'"),
            });
        }
        element.value = option.to_string();
        Ok(())
    }

    async fn storage_state(&self) -> E2eResult<StorageState> {
        Ok(StorageState {
            cookies: self.lock().cookies.clone(),
        })
    }

    async fn close(&self) -> E2eResult<()> {
        self.record("close".to_string());
        Ok(())
    }
}
