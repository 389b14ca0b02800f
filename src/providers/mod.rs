// src/providers/mod.rs
pub mod newsapi;
pub mod openweather;
pub mod tiingo;
pub mod types;

use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::AppConfig;

/// Shared HTTP client for all providers; every request inherits the timeout.
pub fn build_http_client(cfg: &AppConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("daily-dashboard/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(4).min(cfg.provider_timeout))
        .timeout(cfg.provider_timeout)
        .build()
        .context("building provider http client")
}

/// Normalize provider text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, "");
    RE_WS.replace_all(&stripped, " ").trim().to_string()
}

/// Record a degraded provider call.
pub(crate) fn record_provider_error(provider: &'static str) {
    metrics::counter!(crate::metrics::PROVIDER_ERRORS_TOTAL, "provider" => provider).increment(1);
}
