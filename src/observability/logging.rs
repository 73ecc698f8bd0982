//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Level comes from config; `RUST_LOG` overrides when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `default_level` applies to the gateway's own spans when `RUST_LOG` is
/// unset; tower-http request traces ride along at debug.
pub fn init(default_level: &str) {
    let fallback = format!("onboarding_gateway={default_level},tower_http=debug");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
