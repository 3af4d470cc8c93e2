//! Wait mechanisms.
//!
//! Every element wait and navigation in the suite carries a deadline. On
//! expiry the operation fails; this layer never retries past the deadline.

use crate::result::E2eResult;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for element waits (10 seconds)
pub const DEFAULT_ELEMENT_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for navigation (30 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Network idle threshold (500ms without requests)
pub const NETWORK_IDLE_THRESHOLD_MS: u64 = 500;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Ready signal a navigation waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// Wait for `DOMContentLoaded`
    #[default]
    DomContentLoaded,
    /// Wait for the `load` event
    Load,
    /// Wait for the network to be idle (no requests for 500ms)
    NetworkIdle,
}

impl LoadState {
    /// Event name
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::DomContentLoaded => "domcontentloaded",
            Self::Load => "load",
            Self::NetworkIdle => "networkidle",
        }
    }

    /// Whether a `document.readyState` value satisfies this state
    #[must_use]
    pub fn is_reached_by(&self, ready_state: &str) -> bool {
        match self {
            Self::DomContentLoaded => matches!(ready_state, "interactive" | "complete"),
            Self::Load | Self::NetworkIdle => ready_state == "complete",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Deadline
    pub timeout: Duration,
    /// Polling interval
    pub poll_interval: Duration,
    /// Ready signal (navigation only)
    pub wait_until: LoadState,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_ELEMENT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            wait_until: LoadState::default(),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for navigation waits
    #[must_use]
    pub fn navigation() -> Self {
        Self::default().with_timeout(Duration::from_millis(DEFAULT_NAVIGATION_TIMEOUT_MS))
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set load state to wait for
    #[must_use]
    pub const fn with_wait_until(mut self, state: LoadState) -> Self {
        self.wait_until = state;
        self
    }

    /// Timeout in milliseconds (for error messages)
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll an async check until it reports `true` or the deadline passes.
///
/// The check runs at least once, even with a zero timeout. Check errors are
/// returned immediately. On expiry the error built by `on_timeout` is
/// returned.
pub async fn poll_until<P, Fut, E>(
    mut check: P,
    options: &WaitOptions,
    on_timeout: E,
) -> E2eResult<Duration>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = E2eResult<bool>>,
    E: FnOnce() -> crate::result::E2eError,
{
    let start = Instant::now();
    let deadline = start + options.timeout;

    loop {
        if check().await? {
            return Ok(start.elapsed());
        }
        let now = Instant::now();
        if now >= deadline {
            return Err(on_timeout());
        }
        let remaining = deadline - now;
        tokio::time::sleep(options.poll_interval.min(remaining)).await;
    }
}

// =============================================================================
// TESTS
// =============================================================================
