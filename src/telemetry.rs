//! Structured logging setup

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Directive used when `RUST_LOG` is unset
pub fn default_directive(level: &str) -> String {
    format!("triproute={level},tower_http=debug")
}

/// Install the global tracing subscriber
///
/// Only the first call has an effect. `RUST_LOG` overrides `default_level`.
///
/// ```no_run
/// triproute::telemetry::init("info");
/// tracing::info!("Application started");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
