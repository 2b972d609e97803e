//! Diagnostic tracing for the shim.
//!
//! Stdout belongs to the product output (one saved-file line per write), so
//! every trace event goes to stderr. `RUST_LOG` picks the filter; a missing or
//! unparsable value falls back to [`DEFAULT_FILTER`] rather than silencing
//! write warnings.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber. A second call is a no-op.
///
/// ```bash
/// RUST_LOG=documenter=debug documenter run -- node worker.js
/// ```
pub fn init() {
    let raw = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let _ = tracing_subscriber::registry()
        .with(filter_from(raw.as_deref()))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

fn filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|raw| !raw.trim().is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
