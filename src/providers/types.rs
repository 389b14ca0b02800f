// src/providers/types.rs
use chrono::{DateTime, NaiveDate, Utc};

/// Normalized news article as returned by a news provider.
/// Carries no date of its own; the aggregation date comes from the caller.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Article {
    pub headline: String,
    pub description: Option<String>,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct WeatherReading {
    pub location: String,
    pub temperature: f64, // celsius
    pub description: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct StockQuote {
    pub company_name: String,
    pub ticker_symbol: String,
    pub price: f64,
}

/// Providers never fail towards the caller: errors are logged and the
/// result degrades to empty/partial.
#[async_trait::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(&self, date: NaiveDate) -> Vec<Article>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_one(&self, city: &str) -> Option<WeatherReading>;

    /// Sequential `fetch_one` per city; failures are dropped, order is kept.
    async fn fetch_many(&self, cities: &[String]) -> Vec<WeatherReading> {
        let mut out = Vec::with_capacity(cities.len());
        for city in cities {
            if let Some(w) = self.fetch_one(city).await {
                out.push(w);
            }
        }
        out
    }

    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait StockProvider: Send + Sync {
    async fn fetch_quote(&self, ticker: &str) -> Option<StockQuote>;

    /// Sequential `fetch_quote` per ticker; an empty list makes no calls.
    async fn fetch_many(&self, tickers: &[String]) -> Vec<StockQuote> {
        if tickers.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            if let Some(q) = self.fetch_quote(ticker).await {
                out.push(q);
            }
        }
        out
    }

    fn name(&self) -> &'static str;
}
