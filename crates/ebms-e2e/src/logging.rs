//! Log output for suite runs.

use tracing_subscriber::EnvFilter;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event (CI log collectors)
    Json,
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `fallback` (e.g. `"ebms_e2e=info"`).
/// Returns `false` when a subscriber was already installed; repeated calls
/// from several tests are harmless.
pub fn init_tracing(fallback: &str, format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer();

    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}
