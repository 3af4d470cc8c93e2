//! Chromium control over the Chrome DevTools Protocol.
//!
//! Element queries and actions are compiled to JavaScript from
//! [`Selector::to_query`] and evaluated in the page.

use crate::config::EnvConfig;
use crate::driver::{Cookie, PageDriver, SharedPage, StorageState};
use crate::locator::Selector;
use crate::result::{E2eError, E2eResult};
use crate::wait::{LoadState, DEFAULT_POLL_INTERVAL_MS, NETWORK_IDLE_THRESHOLD_MS};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Browser launch options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Run without a window
    pub headless: bool,
    /// Chromium sandbox (disable in containers)
    pub sandbox: bool,
    /// Path to the chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            chromium_path: None,
            window_width: 1280,
            window_height: 720,
        }
    }
}

impl LaunchOptions {
    /// Options following the run configuration (`HEADLESS`)
    #[must_use]
    pub fn from_config(config: &EnvConfig) -> Self {
        Self {
            headless: config.headless,
            ..Self::default()
        }
    }

    /// Disable the sandbox
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Use a specific chromium binary
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }
}

/// Running Chromium instance
#[derive(Debug)]
pub struct ChromiumBrowser {
    inner: Arc<Mutex<CdpBrowser>>,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromiumBrowser {
    /// Launch Chromium
    pub async fn launch(options: &LaunchOptions) -> E2eResult<Self> {
        let mut builder = CdpConfig::builder().window_size(options.window_width, options.window_height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let cdp_config = builder
            .build()
            .map_err(|message| E2eError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| E2eError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!(headless = options.headless, "chromium launched");
        Ok(Self {
            inner: Arc::new(Mutex::new(browser)),
            handle,
        })
    }

    /// Open a blank page
    pub async fn new_page(&self) -> E2eResult<SharedPage> {
        let browser = self.inner.lock().await;
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| E2eError::driver(e.to_string()))?;
        Ok(Arc::new(CdpDriver::new(page)))
    }

    /// Shut the browser down
    pub async fn close(self) -> E2eResult<()> {
        {
            let mut browser = self.inner.lock().await;
            let _ = browser
                .close()
                .await
                .map_err(|e| E2eError::driver(e.to_string()))?;
        }
        self.handle.abort();
        Ok(())
    }
}

/// [`PageDriver`] over one Chromium tab
#[derive(Debug, Clone)]
pub struct CdpDriver {
    page: CdpPage,
    poll_interval: Duration,
}

impl CdpDriver {
    /// Wrap a chromiumoxide page
    #[must_use]
    pub const fn new(page: CdpPage) -> Self {
        Self {
            page,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }

    async fn eval<T: DeserializeOwned>(&self, expr: &str) -> E2eResult<T> {
        let result = self
            .page
            .evaluate(expr)
            .await
            .map_err(|e| E2eError::driver(e.to_string()))?;
        result
            .into_value()
            .map_err(|e| E2eError::driver(e.to_string()))
    }

    async fn act(&self, selector: &Selector, body: &str) -> E2eResult<()> {
        let status: String = self.eval(&element_script(selector, body)).await?;
        match status.as_str() {
            "ok" => Ok(()),
            "missing" => Err(E2eError::Element {
                selector: selector.to_string(),
                message: "no element matches".to_string(),
            }),
            other => Err(E2eError::Element {
                selector: selector.to_string(),
                message: other.to_string(),
            }),
        }
    }

    async fn wait_ready(&self, wait_until: LoadState) -> E2eResult<()> {
        loop {
            let state: String = self.eval("document.readyState").await?;
            if wait_until.is_reached_by(&state) {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        if wait_until == LoadState::NetworkIdle {
            // Approximation: no request tracking, just a quiet period after load
            tokio::time::sleep(Duration::from_millis(NETWORK_IDLE_THRESHOLD_MS)).await;
        }
        Ok(())
    }
}

fn element_script(selector: &Selector, body: &str) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return 'missing'; {body} }})()",
        selector.to_query()
    )
}

const VISIBLE_CHECK: &str = "const style = window.getComputedStyle(el); \
     const rect = el.getBoundingClientRect(); \
     return style.visibility !== 'hidden' && style.display !== 'none' && rect.width > 0 && rect.height > 0;";

fn fill_script(value: &str) -> E2eResult<String> {
    let value = serde_json::to_string(value)?;
    Ok(format!(
        "if (el.disabled) return 'element is disabled'; \
         el.focus(); el.value = {value}; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return 'ok';"
    ))
}

fn select_script(option: &str) -> E2eResult<String> {
    let option = serde_json::to_string(option)?;
    Ok(format!(
        "const opt = Array.from(el.options || []).find(o => o.value === {option} || o.label.trim() === {option}); \
         if (!opt) return 'no such option'; \
         el.value = opt.value; \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return 'ok';"
    ))
}

#[async_trait]
impl PageDriver for CdpDriver {
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> E2eResult<()> {
        let navigation = async {
            let _ = self.page.goto(url).await.map_err(|e| E2eError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
            self.wait_ready(wait_until).await
        };
        tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| E2eError::NavigationTimeout {
                url: url.to_string(),
                ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })?
    }

    async fn current_url(&self) -> E2eResult<String> {
        Ok(self
            .page
            .url()
            .await
            .map_err(|e| E2eError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(|e| E2eError::driver(e.to_string()))?
            .unwrap_or_default())
    }

    async fn is_visible(&self, selector: &Selector) -> E2eResult<bool> {
        let script = format!(
            "(() => {{ const el = {}; if (!el) return false; {VISIBLE_CHECK} }})()",
            selector.to_query()
        );
        self.eval(&script).await
    }

    async fn is_enabled(&self, selector: &Selector) -> E2eResult<bool> {
        let script = format!("(() => {{ const el = {}; return !!el && !el.disabled; }})()", selector.to_query());
        self.eval(&script).await
    }

    async fn is_checked(&self, selector: &Selector) -> E2eResult<bool> {
        let script = format!("(() => {{ const el = {}; return !!el && !!el.checked; }})()", selector.to_query());
        self.eval(&script).await
    }

    async fn text_content(&self, selector: &Selector) -> E2eResult<Option<String>> {
        let script = format!("(() => {{ const el = {}; return el ? el.textContent : null; }})()", selector.to_query());
        self.eval(&script).await
    }

    async fn input_value(&self, selector: &Selector) -> E2eResult<String> {
        let script = format!("(() => {{ const el = {}; return el ? (el.value ?? '') : null; }})()", selector.to_query());
        let value: Option<String> = self.eval(&script).await?;
        value.ok_or_else(|| E2eError::Element {
            selector: selector.to_string(),
            message: "no element matches".to_string(),
        })
    }

    async fn count(&self, selector: &Selector) -> E2eResult<usize> {
        self.eval(&selector.to_count_query()).await
    }

    async fn fill(&self, selector: &Selector, value: &str) -> E2eResult<()> {
        self.act(selector, &fill_script(value)?).await
    }

    async fn click(&self, selector: &Selector) -> E2eResult<()> {
        self.act(
            selector,
            "if (el.disabled) return 'element is disabled'; el.click(); return 'ok';",
        )
        .await
    }

    async fn set_checked(&self, selector: &Selector, checked: bool) -> E2eResult<()> {
        let body = format!(
            "if (el.disabled) return 'element is disabled'; if (!!el.checked !== {checked}) el.click(); return 'ok';"
        );
        self.act(selector, &body).await
    }

    async fn select_option(&self, selector: &Selector, option: &str) -> E2eResult<()> {
        self.act(selector, &select_script(option)?).await
    }

    async fn storage_state(&self) -> E2eResult<StorageState> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|e| E2eError::driver(e.to_string()))?
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                expires: c.expires,
                http_only: c.http_only,
                secure: c.secure,
            })
            .collect();
        Ok(StorageState { cookies })
    }

    async fn close(&self) -> E2eResult<()> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| E2eError::driver(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_options_follow_config() {
        let mut config = EnvConfig::default();
        config.headless = false;
        let options = LaunchOptions::from_config(&config);
        assert!(!options.headless);
        assert!(options.sandbox);
        assert!(!options.with_no_sandbox().sandbox);
    }

    #[test]
    fn test_element_script_guards_missing() {
        let script = element_script(&Selector::test_id("user-menu"), "return 'ok';");
        assert!(script.contains("data-testid"));
        assert!(script.contains("if (!el) return 'missing';"));
    }

    #[test]
    fn test_fill_script_escapes_value() {
        let script = fill_script("a\"b\\c").unwrap();
        assert!(script.contains(r#"el.value = "a\"b\\c";"#));
    }

    #[test]
    fn test_select_script_matches_value_or_label() {
        let script = select_script("Active").unwrap();
        assert!(script.contains(r#"o.value === "Active""#));
        assert!(script.contains(r#"o.label.trim() === "Active""#));
    }
}
