//! Tracing subscriber setup for binaries and demos

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info";

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to `info`.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init() -> bool {
    init_with_default(DEFAULT_FILTER)
}

/// Like [`init`] with a caller-chosen fallback filter, e.g.
/// `"launch_impact=debug,demand_forecast=info"`
pub fn init_with_default(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .is_ok()
}
