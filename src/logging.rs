//! Logging setup. Library crates log through the `log` facade; this installs
//! a `tracing-subscriber` fmt subscriber and bridges `log` records into it.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` takes precedence over `filter`.
///
/// Returns `false` when a subscriber was already installed, in which case
/// nothing changes.
pub fn init(filter: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    // logs-json: one JSON object per line for log aggregation.
    #[cfg(feature = "logs-json")]
    let installed = builder.json().try_init().is_ok();
    #[cfg(not(feature = "logs-json"))]
    let installed = builder.try_init().is_ok();

    if installed {
        tracing::debug!(filter, "logging initialised");
    }
    installed
}
