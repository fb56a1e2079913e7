//! Tracing subscriber setup.
//!
//! Log output goes to stderr through an env-filtered fmt layer; set
//! `RUST_LOG` to adjust verbosity (defaults to `info`).

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. Call once, before any spans or events.
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
