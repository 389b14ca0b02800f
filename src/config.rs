// src/config.rs
//! Runtime configuration read from the environment (`.env` is loaded by the binary).

use anyhow::{anyhow, Context, Result};
use std::time::Duration;

pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_OPENWEATHER_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_TIINGO_API_KEY: &str = "TIINGO_API_KEY";
pub const ENV_NEWS_API_BASE_URL: &str = "NEWS_API_BASE_URL";
pub const ENV_OPENWEATHER_BASE_URL: &str = "OPENWEATHER_BASE_URL";
pub const ENV_TIINGO_BASE_URL: &str = "TIINGO_BASE_URL";
pub const ENV_PROVIDER_TIMEOUT_SECS: &str = "PROVIDER_TIMEOUT_SECS";
pub const ENV_DASHBOARD_WINDOW_DAYS: &str = "DASHBOARD_WINDOW_DAYS";

pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIINGO_BASE_URL: &str = "https://api.tiingo.com";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DASHBOARD_WINDOW_DAYS: u32 = 7;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub news_api_key: String,
    pub openweather_api_key: String,
    pub tiingo_api_key: String,
    pub news_api_base_url: String,
    pub openweather_base_url: String,
    pub tiingo_base_url: String,
    /// Applied to every outbound provider request.
    pub provider_timeout: Duration,
    /// How many days (including today) the dashboard serves.
    pub window_days: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            news_api_key: String::new(),
            openweather_api_key: String::new(),
            tiingo_api_key: String::new(),
            news_api_base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
            openweather_base_url: DEFAULT_OPENWEATHER_BASE_URL.to_string(),
            tiingo_base_url: DEFAULT_TIINGO_BASE_URL.to_string(),
            provider_timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            window_days: DEFAULT_DASHBOARD_WINDOW_DAYS,
        }
    }
}

impl AppConfig {
    /// Build from env vars. Missing API keys are allowed (providers then
    /// degrade to empty results); malformed numbers are an error.
    pub fn from_env() -> Result<Self> {
        let d = Self::default();

        let provider_timeout = match env_opt(ENV_PROVIDER_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw
                    .parse()
                    .with_context(|| format!("{ENV_PROVIDER_TIMEOUT_SECS}={raw:?}"))?;
                if secs == 0 {
                    return Err(anyhow!("{ENV_PROVIDER_TIMEOUT_SECS} must be > 0"));
                }
                Duration::from_secs(secs)
            }
            None => d.provider_timeout,
        };

        let window_days = match env_opt(ENV_DASHBOARD_WINDOW_DAYS) {
            Some(raw) => {
                let days: u32 = raw
                    .parse()
                    .with_context(|| format!("{ENV_DASHBOARD_WINDOW_DAYS}={raw:?}"))?;
                days.max(1)
            }
            None => d.window_days,
        };

        let cfg = Self {
            news_api_key: env_opt(ENV_NEWS_API_KEY).unwrap_or_default(),
            openweather_api_key: env_opt(ENV_OPENWEATHER_API_KEY).unwrap_or_default(),
            tiingo_api_key: env_opt(ENV_TIINGO_API_KEY).unwrap_or_default(),
            news_api_base_url: env_opt(ENV_NEWS_API_BASE_URL).unwrap_or(d.news_api_base_url),
            openweather_base_url: env_opt(ENV_OPENWEATHER_BASE_URL)
                .unwrap_or(d.openweather_base_url),
            tiingo_base_url: env_opt(ENV_TIINGO_BASE_URL).unwrap_or(d.tiingo_base_url),
            provider_timeout,
            window_days,
        };

        for (name, key) in [
            (ENV_NEWS_API_KEY, &cfg.news_api_key),
            (ENV_OPENWEATHER_API_KEY, &cfg.openweather_api_key),
            (ENV_TIINGO_API_KEY, &cfg.tiingo_api_key),
        ] {
            if key.is_empty() {
                tracing::warn!(var = name, "API key not set; provider will return no data");
            }
        }

        Ok(cfg)
    }
}

/// Trimmed env var, `None` when unset or blank.
fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
