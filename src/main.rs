//! Daily Dashboard: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, keyword tables, store, and metrics.

use daily_dashboard::{api, metrics::Metrics, AppState};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing logs; `RUST_LOG` overrides the default filter.
/// Uses `try_init` so an already-installed subscriber (e.g. the runtime's) wins.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_dashboard=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let state = AppState::from_env()?;
    let timeout_ms = state.config().provider_timeout.as_millis() as u64;
    let metrics = Metrics::init(timeout_ms)?;

    tracing::info!(
        window_days = state.config().window_days,
        timeout_ms,
        "daily dashboard starting"
    );

    let router = api::router(state).merge(metrics.router());

    Ok(router.into())
}
