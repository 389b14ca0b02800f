// src/store/mod.rs
//! Date-partitioned persistence for news, weather and stock rows plus the
//! link rows that join them.
//!
//! `fetched_for_date` is the partition and cache key. Rows are append-only;
//! a day is written as one [`DayBatch`] that either lands completely or not at all.

pub mod memory;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::providers::types::{Article, StockQuote, WeatherReading};

pub use memory::MemoryStore;

pub type RowId = i64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub id: RowId,
    pub headline: String,
    pub description: Option<String>,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub fetched_for_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRecord {
    pub id: RowId,
    pub location: String,
    pub temperature: Decimal,
    pub description: String,
    pub fetched_for_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRecord {
    pub id: RowId,
    pub company_name: String,
    pub ticker_symbol: String,
    pub price: Decimal,
    pub fetched_for_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Joins one news row to a weather row and/or a stock row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsLink {
    pub id: RowId,
    pub news_id: RowId,
    pub weather_id: Option<RowId>,
    pub stock_id: Option<RowId>,
}

/// Link described by position inside a [`DayBatch`]; ids are resolved at commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkPlan {
    pub news: usize,
    pub weather: Option<usize>,
    pub stock: Option<usize>,
}

/// Everything fetched for one date, written as a unit.
#[derive(Debug, Clone)]
pub struct DayBatch {
    pub date: NaiveDate,
    pub news: Vec<Article>,
    pub weather: Vec<WeatherReading>,
    pub stocks: Vec<StockQuote>,
    pub links: Vec<LinkPlan>,
}

/// Ids assigned by a committed batch, in batch order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub news_ids: Vec<RowId>,
    pub weather_ids: Vec<RowId>,
    pub stock_ids: Vec<RowId>,
    pub link_ids: Vec<RowId>,
}

#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Cache probe: does any news row exist for `date`?
    async fn has_news_for(&self, date: NaiveDate) -> Result<bool>;

    /// News rows for `date` in insertion order, optionally capped.
    async fn news_for(&self, date: NaiveDate, limit: Option<usize>) -> Result<Vec<NewsItem>>;

    async fn weather_for(&self, date: NaiveDate) -> Result<Vec<WeatherRecord>>;

    async fn stocks_for(&self, date: NaiveDate) -> Result<Vec<StockRecord>>;

    async fn links_for_news(&self, news_id: RowId) -> Result<Vec<NewsLink>>;

    /// Atomically insert all rows of `batch`. An invalid link aborts the
    /// whole batch and nothing becomes visible.
    async fn persist_day(&self, batch: DayBatch) -> Result<PersistSummary>;
}

/// Write-path normalization for temperatures and prices: 2 dp, halves away from zero.
pub fn to_2dp(v: f64) -> Decimal {
    Decimal::from_f64(v)
        .unwrap_or_default()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
