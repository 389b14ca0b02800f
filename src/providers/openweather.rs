use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::providers::record_provider_error;
use crate::providers::types::{WeatherProvider, WeatherReading};

const PROVIDER: &str = "OpenWeatherMap";

/// Successful lookups keyed by the requested city name.
///
/// Owned by one provider instance and dropped with it; no expiry, no eviction.
#[derive(Debug, Default)]
pub struct WeatherCache {
    inner: Mutex<HashMap<String, WeatherReading>>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, city: &str) -> Option<WeatherReading> {
        self.inner.lock().get(city).cloned()
    }

    pub fn insert(&self, city: &str, reading: WeatherReading) {
        self.inner.lock().insert(city.to_string(), reading);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Deserialize)]
struct RawWeather {
    name: Option<String>,
    main: Option<RawMain>,
    #[serde(default)]
    weather: Vec<RawCondition>,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawCondition {
    description: Option<String>,
}

pub struct OpenWeatherProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: WeatherCache,
}

impl OpenWeatherProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            cache: WeatherCache::new(),
        }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    async fn try_fetch(&self, city: &str) -> Result<WeatherReading> {
        let resp = self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .context("openweather http get()")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("openweather status {status}"));
        }
        let body = resp.text().await.context("openweather http .text()")?;
        parse_weather(&body, city)
    }
}

/// Map a `/weather` body; `city` stands in for a missing `name`.
pub fn parse_weather(body: &str, city: &str) -> Result<WeatherReading> {
    let raw: RawWeather = serde_json::from_str(body).context("parsing openweather json")?;
    Ok(WeatherReading {
        location: raw.name.unwrap_or_else(|| city.to_string()),
        temperature: raw.main.and_then(|m| m.temp).unwrap_or(0.0),
        description: raw
            .weather
            .into_iter()
            .next()
            .and_then(|c| c.description)
            .unwrap_or_else(|| "Unknown".to_string()),
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_one(&self, city: &str) -> Option<WeatherReading> {
        if let Some(hit) = self.cache.get(city) {
            metrics::counter!(crate::metrics::WEATHER_CACHE_HITS_TOTAL).increment(1);
            return Some(hit);
        }

        match self.try_fetch(city).await {
            Ok(reading) => {
                self.cache.insert(city, reading.clone());
                Some(reading)
            }
            Err(e) => {
                tracing::warn!(error = ?e, provider = PROVIDER, city, "weather fetch failed");
                record_provider_error(PROVIDER);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_body() {
        let body = r#"{"name":"London","main":{"temp":11.37},"weather":[{"description":"light rain"},{"description":"mist"}]}"#;
        let w = parse_weather(body, "london").unwrap();
        assert_eq!(w.location, "London");
        assert!((w.temperature - 11.37).abs() < 1e-9);
        assert_eq!(w.description, "light rain");
    }

    #[test]
    fn defaults_for_missing_fields() {
        let w = parse_weather("{}", "Oslo").unwrap();
        assert_eq!(w.location, "Oslo");
        assert_eq!(w.temperature, 0.0);
        assert_eq!(w.description, "Unknown");
    }

    #[test]
    fn cache_round_trip() {
        let c = WeatherCache::new();
        assert!(c.is_empty());
        c.insert(
            "Paris",
            WeatherReading {
                location: "Paris".into(),
                temperature: 9.0,
                description: "clear sky".into(),
            },
        );
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("Paris").map(|w| w.description), Some("clear sky".into()));
        assert!(c.get("paris").is_none());
    }
}
