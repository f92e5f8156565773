//! Subscriber setup for the `treegrid` binary.
//!
//! Events go to stderr so stdout carries only rendered output. The filter
//! comes from `RUST_LOG` and defaults to `warn`.

use tracing_subscriber::EnvFilter;

/// Default directive when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. `json` selects JSON lines output.
pub fn init(json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    }
}
