//! In-process store: four tables behind one `RwLock`, with per-date and
//! per-news indexes. A batch is validated before anything is written, so a
//! rejected batch leaves the tables untouched.

use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;

use super::{
    to_2dp, DayBatch, NewsItem, NewsLink, PersistSummary, RowId, StockRecord, Store,
    WeatherRecord,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    news: BTreeMap<RowId, NewsItem>,
    weather: BTreeMap<RowId, WeatherRecord>,
    stocks: BTreeMap<RowId, StockRecord>,
    links: BTreeMap<RowId, NewsLink>,

    news_by_date: HashMap<NaiveDate, Vec<RowId>>,
    weather_by_date: HashMap<NaiveDate, Vec<RowId>>,
    stocks_by_date: HashMap<NaiveDate, Vec<RowId>>,
    links_by_news: HashMap<RowId, Vec<RowId>>,

    next_news: RowId,
    next_weather: RowId,
    next_stock: RowId,
    next_link: RowId,
}

fn alloc(counter: &mut RowId) -> RowId {
    *counter += 1;
    *counter
}

fn rows_for<'a, T: Clone>(
    table: &'a BTreeMap<RowId, T>,
    index: &'a HashMap<NaiveDate, Vec<RowId>>,
    date: NaiveDate,
) -> impl Iterator<Item = T> + 'a {
    index
        .get(&date)
        .into_iter()
        .flatten()
        .filter_map(move |id| table.get(id).cloned())
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row counts as (news, weather, stocks, links); handy in diagnostics and tests.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        let t = self.inner.read();
        (t.news.len(), t.weather.len(), t.stocks.len(), t.links.len())
    }

    /// Maintenance: remove a news row and its link rows. Returns whether it existed.
    pub fn delete_news(&self, news_id: RowId) -> bool {
        let mut t = self.inner.write();
        let Some(item) = t.news.remove(&news_id) else {
            return false;
        };
        if let Some(ids) = t.news_by_date.get_mut(&item.fetched_for_date) {
            ids.retain(|id| *id != news_id);
        }
        if let Some(link_ids) = t.links_by_news.remove(&news_id) {
            for id in link_ids {
                t.links.remove(&id);
            }
        }
        true
    }
}

fn validate_links(batch: &DayBatch) -> Result<()> {
    for (i, l) in batch.links.iter().enumerate() {
        if l.weather.is_none() && l.stock.is_none() {
            return Err(anyhow!("link #{i} references neither weather nor stock"));
        }
        if l.news >= batch.news.len() {
            return Err(anyhow!("link #{i} references missing news row {}", l.news));
        }
        if let Some(w) = l.weather {
            if w >= batch.weather.len() {
                return Err(anyhow!("link #{i} references missing weather row {w}"));
            }
        }
        if let Some(s) = l.stock {
            if s >= batch.stocks.len() {
                return Err(anyhow!("link #{i} references missing stock row {s}"));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn has_news_for(&self, date: NaiveDate) -> Result<bool> {
        let t = self.inner.read();
        let hit = t.news_by_date.get(&date).is_some_and(|ids| !ids.is_empty());
        Ok(hit)
    }

    async fn news_for(&self, date: NaiveDate, limit: Option<usize>) -> Result<Vec<NewsItem>> {
        let t = self.inner.read();
        let rows = rows_for(&t.news, &t.news_by_date, date);
        let out = match limit {
            Some(n) => rows.take(n).collect(),
            None => rows.collect(),
        };
        Ok(out)
    }

    async fn weather_for(&self, date: NaiveDate) -> Result<Vec<WeatherRecord>> {
        let t = self.inner.read();
        let out = rows_for(&t.weather, &t.weather_by_date, date).collect();
        Ok(out)
    }

    async fn stocks_for(&self, date: NaiveDate) -> Result<Vec<StockRecord>> {
        let t = self.inner.read();
        let out = rows_for(&t.stocks, &t.stocks_by_date, date).collect();
        Ok(out)
    }

    async fn links_for_news(&self, news_id: RowId) -> Result<Vec<NewsLink>> {
        let t = self.inner.read();
        let out = t
            .links_by_news
            .get(&news_id)
            .into_iter()
            .flatten()
            .filter_map(|id| t.links.get(id).cloned())
            .collect();
        Ok(out)
    }

    async fn persist_day(&self, batch: DayBatch) -> Result<PersistSummary> {
        validate_links(&batch)?;

        let date = batch.date;
        let now = Utc::now();
        let mut t = self.inner.write();
        let mut summary = PersistSummary::default();

        for a in batch.news {
            let id = alloc(&mut t.next_news);
            t.news.insert(
                id,
                NewsItem {
                    id,
                    headline: a.headline,
                    description: a.description,
                    url: a.url,
                    source: a.source,
                    published_at: a.published_at,
                    fetched_for_date: date,
                    created_at: now,
                },
            );
            t.news_by_date.entry(date).or_default().push(id);
            summary.news_ids.push(id);
        }

        for w in batch.weather {
            let id = alloc(&mut t.next_weather);
            t.weather.insert(
                id,
                WeatherRecord {
                    id,
                    location: w.location,
                    temperature: to_2dp(w.temperature),
                    description: w.description,
                    fetched_for_date: date,
                    created_at: now,
                },
            );
            t.weather_by_date.entry(date).or_default().push(id);
            summary.weather_ids.push(id);
        }

        for s in batch.stocks {
            let id = alloc(&mut t.next_stock);
            t.stocks.insert(
                id,
                StockRecord {
                    id,
                    company_name: s.company_name,
                    ticker_symbol: s.ticker_symbol,
                    price: to_2dp(s.price),
                    fetched_for_date: date,
                    created_at: now,
                },
            );
            t.stocks_by_date.entry(date).or_default().push(id);
            summary.stock_ids.push(id);
        }

        // Indexes were validated above, so these lookups cannot miss.
        for plan in batch.links {
            let id = alloc(&mut t.next_link);
            let news_id = summary.news_ids[plan.news];
            let link = NewsLink {
                id,
                news_id,
                weather_id: plan.weather.map(|i| summary.weather_ids[i]),
                stock_id: plan.stock.map(|i| summary.stock_ids[i]),
            };
            t.links.insert(id, link);
            t.links_by_news.entry(news_id).or_default().push(id);
            summary.link_ids.push(id);
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::types::{Article, StockQuote, WeatherReading};
    use crate::store::LinkPlan;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, d).unwrap()
    }

    fn article(h: &str) -> Article {
        Article {
            headline: h.to_string(),
            description: None,
            url: format!("https://example.test/{h}"),
            source: "Test".into(),
            published_at: Utc::now(),
        }
    }

    fn batch(d: NaiveDate) -> DayBatch {
        DayBatch {
            date: d,
            news: vec![article("a"), article("b")],
            weather: vec![WeatherReading {
                location: "Oslo".into(),
                temperature: -1.234,
                description: "snow".into(),
            }],
            stocks: vec![StockQuote {
                company_name: "Apple Inc.".into(),
                ticker_symbol: "AAPL".into(),
                price: 175.239,
            }],
            links: vec![
                LinkPlan {
                    news: 0,
                    weather: Some(0),
                    stock: None,
                },
                LinkPlan {
                    news: 0,
                    weather: None,
                    stock: Some(0),
                },
            ],
        }
    }

    #[tokio::test]
    async fn persist_assigns_ids_and_resolves_links() {
        let store = MemoryStore::new();
        let s = store.persist_day(batch(date(3))).await.unwrap();
        assert_eq!(s.news_ids, vec![1, 2]);
        assert_eq!(s.weather_ids, vec![1]);
        assert_eq!(s.stock_ids, vec![1]);

        let links = store.links_for_news(1).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].weather_id, Some(1));
        assert_eq!(links[0].stock_id, None);
        assert_eq!(links[1].stock_id, Some(1));
        assert!(store.links_for_news(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn decimals_are_rounded_on_write() {
        let store = MemoryStore::new();
        store.persist_day(batch(date(3))).await.unwrap();
        assert_eq!(store.weather_for(date(3)).await.unwrap()[0].temperature, dec!(-1.23));
        assert_eq!(store.stocks_for(date(3)).await.unwrap()[0].price, dec!(175.24));
    }

    #[tokio::test]
    async fn queries_are_partitioned_by_date() {
        let store = MemoryStore::new();
        store.persist_day(batch(date(3))).await.unwrap();
        assert!(store.has_news_for(date(3)).await.unwrap());
        assert!(!store.has_news_for(date(4)).await.unwrap());
        assert!(store.weather_for(date(4)).await.unwrap().is_empty());
        assert_eq!(store.news_for(date(3), Some(1)).await.unwrap().len(), 1);
        assert_eq!(store.news_for(date(3), None).await.unwrap()[1].headline, "b");
    }

    #[tokio::test]
    async fn invalid_link_rejects_whole_batch() {
        let store = MemoryStore::new();
        let mut b = batch(date(3));
        b.links.push(LinkPlan {
            news: 0,
            weather: None,
            stock: Some(7),
        });
        assert!(store.persist_day(b).await.is_err());
        assert_eq!(store.counts(), (0, 0, 0, 0));
        assert!(!store.has_news_for(date(3)).await.unwrap());

        let mut empty_link = batch(date(3));
        empty_link.links = vec![LinkPlan {
            news: 0,
            weather: None,
            stock: None,
        }];
        assert!(store.persist_day(empty_link).await.is_err());
        assert_eq!(store.counts(), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn delete_news_cascades_to_links() {
        let store = MemoryStore::new();
        store.persist_day(batch(date(3))).await.unwrap();
        assert!(store.delete_news(1));
        assert!(!store.delete_news(1));
        assert_eq!(store.counts(), (1, 1, 1, 0));
        assert_eq!(store.news_for(date(3), None).await.unwrap()[0].id, 2);
    }
}
