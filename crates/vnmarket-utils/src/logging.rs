//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber with default configuration
pub fn init_tracing() {
    init_tracing_with("info", false);
}

/// Initialize tracing with a fallback filter used when `RUST_LOG` is unset.
///
/// `json` switches the fmt layer to newline-delimited JSON output.
pub fn init_tracing_with(default_filter: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(filter);
    // try_init: a second initialisation (tests, embedding) must not panic
    let result = if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if let Err(e) = result {
        tracing::debug!("tracing already initialised: {e}");
    }
}
