//! Subscriber setup for the command-line binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary so embedders can route events wherever they like.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_FILTER: &str = "info";

/// Human-readable logs on stderr, filtered by `RUST_LOG` (default `info`).
/// `verbose` raises the default to `debug`. Calling twice is harmless.
pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { DEFAULT_FILTER };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
