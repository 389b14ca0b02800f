//! # Aggregator
//!
//! One call per requested date:
//!
//! `check cache → (hit) return cached`
//! `          → (miss) fetch news → (empty) return empty`
//! `                              → extract keywords → weather ∥ stocks → persist → re-read`
//!
//! Provider failures never surface here (providers degrade on their own);
//! store failures propagate to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::keywords::KeywordMatcher;
use crate::providers::types::{NewsProvider, StockProvider, WeatherProvider};
use crate::store::{DayBatch, LinkPlan, NewsItem, StockRecord, Store, WeatherRecord};

/// Maximum number of news rows returned per day.
pub const NEWS_LIMIT: usize = 5;

/// What the dashboard shows for one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardData {
    pub news: Vec<NewsItem>,
    pub weather: Vec<WeatherRecord>,
    pub stocks: Vec<StockRecord>,
}

impl DashboardData {
    pub fn is_empty(&self) -> bool {
        self.news.is_empty() && self.weather.is_empty() && self.stocks.is_empty()
    }
}

pub struct Aggregator {
    news: Box<dyn NewsProvider>,
    weather: Box<dyn WeatherProvider>,
    stocks: Box<dyn StockProvider>,
    matcher: Arc<KeywordMatcher>,
    store: Arc<dyn Store>,
}

impl Aggregator {
    pub fn new(
        news: Box<dyn NewsProvider>,
        weather: Box<dyn WeatherProvider>,
        stocks: Box<dyn StockProvider>,
        matcher: Arc<KeywordMatcher>,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            news,
            weather,
            stocks,
            matcher,
            store,
        }
    }

    pub async fn aggregate_data(&self, date: NaiveDate) -> Result<DashboardData> {
        if self.store.has_news_for(date).await? {
            metrics::counter!(crate::metrics::AGGREGATE_CACHE_HITS_TOTAL).increment(1);
            tracing::debug!(%date, "dashboard cache hit");
            return self.read_day(date).await;
        }
        metrics::counter!(crate::metrics::AGGREGATE_CACHE_MISSES_TOTAL).increment(1);

        let articles = self.news.fetch_news(date).await;
        if articles.is_empty() {
            // Not cached: the next request for this date tries again.
            metrics::counter!(crate::metrics::AGGREGATE_EMPTY_DAYS_TOTAL).increment(1);
            tracing::warn!(%date, provider = self.news.name(), "no news articles fetched");
            return Ok(DashboardData::default());
        }

        let locations = self.matcher.extract_locations(&articles);
        let tickers: Vec<String> = self
            .matcher
            .extract_companies(&articles)
            .into_iter()
            .map(|c| c.ticker)
            .collect();
        tracing::debug!(%date, ?locations, ?tickers, "keywords extracted");

        let (weather, stocks) = tokio::join!(
            self.weather.fetch_many(&locations),
            self.stocks.fetch_many(&tickers),
        );

        let links = first_news_links(weather.len(), stocks.len());
        let batch = DayBatch {
            date,
            news: articles,
            weather,
            stocks,
            links,
        };
        let summary = self
            .store
            .persist_day(batch)
            .await
            .with_context(|| format!("persisting dashboard data for {date}"))?;

        tracing::info!(
            %date,
            news = summary.news_ids.len(),
            weather = summary.weather_ids.len(),
            stocks = summary.stock_ids.len(),
            links = summary.link_ids.len(),
            "dashboard data aggregated"
        );

        self.read_day(date).await
    }

    async fn read_day(&self, date: NaiveDate) -> Result<DashboardData> {
        Ok(DashboardData {
            news: self.store.news_for(date, Some(NEWS_LIMIT)).await?,
            weather: self.store.weather_for(date).await?,
            stocks: self.store.stocks_for(date).await?,
        })
    }
}

/// Every weather row and every stock row hangs off the first news row of the
/// batch, one link per row.
fn first_news_links(weather: usize, stocks: usize) -> Vec<LinkPlan> {
    let to_weather = (0..weather).map(|i| LinkPlan {
        news: 0,
        weather: Some(i),
        stock: None,
    });
    let to_stocks = (0..stocks).map(|i| LinkPlan {
        news: 0,
        weather: None,
        stock: Some(i),
    });
    to_weather.chain(to_stocks).collect()
}
