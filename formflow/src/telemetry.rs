//! Tracing initialization.
//!
//! Console logging through `tracing-subscriber`'s fmt layer, filtered by `RUST_LOG`. When
//! `RUST_LOG` is unset the filter defaults to `info`.
//!
//! ```bash
//! RUST_LOG="formflow=debug,tower_http=debug,sqlx=warn" formflow -f config.yaml
//! ```

use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize the global tracing subscriber.
///
/// Fails if a global subscriber has already been installed.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
