use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const PROVIDER_ERRORS_TOTAL: &str = "provider_errors_total";
pub const WEATHER_CACHE_HITS_TOTAL: &str = "weather_cache_hits_total";
pub const AGGREGATE_CACHE_HITS_TOTAL: &str = "aggregate_cache_hits_total";
pub const AGGREGATE_CACHE_MISSES_TOTAL: &str = "aggregate_cache_misses_total";
pub const AGGREGATE_EMPTY_DAYS_TOTAL: &str = "aggregate_empty_days_total";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            PROVIDER_ERRORS_TOTAL,
            "Provider calls that failed and degraded to empty results."
        );
        describe_counter!(
            WEATHER_CACHE_HITS_TOTAL,
            "Weather lookups answered from the per-provider cache."
        );
        describe_counter!(
            AGGREGATE_CACHE_HITS_TOTAL,
            "Dashboard requests served from stored data."
        );
        describe_counter!(
            AGGREGATE_CACHE_MISSES_TOTAL,
            "Dashboard requests that had to fetch from providers."
        );
        describe_counter!(
            AGGREGATE_EMPTY_DAYS_TOTAL,
            "Cache misses where the news provider returned nothing."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and expose the provider timeout as a gauge.
    pub fn init(provider_timeout_ms: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        ensure_metrics_described();
        gauge!("provider_timeout_ms").set(provider_timeout_ms as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
