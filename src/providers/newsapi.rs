use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::providers::types::{Article, NewsProvider};
use crate::providers::{normalize_text, record_provider_error};

const PROVIDER: &str = "NewsAPI";
/// Broad query for the day's general news.
const BROAD_QUERY: &str = "a OR the OR is";
const PAGE_SIZE: &str = "10";

#[derive(Debug, Deserialize)]
struct Envelope {
    articles: Option<Vec<RawArticle>>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    source: Option<RawSource>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

pub struct NewsApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NewsApiProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    async fn try_fetch(&self, date: NaiveDate) -> Result<Vec<Article>> {
        let day = date.format("%Y-%m-%d").to_string();
        let resp = self
            .client
            .get(format!("{}/everything", self.base_url))
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("q", BROAD_QUERY),
                ("from", day.as_str()),
                ("to", day.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", PAGE_SIZE),
                ("language", "en"),
            ])
            .send()
            .await
            .context("newsapi http get()")?;

        let status = resp.status();
        let body = resp.text().await.context("newsapi http .text()")?;
        if !status.is_success() {
            return Err(anyhow!("newsapi status {status}: {}", truncate(&body, 200)));
        }

        parse_articles(&body, Utc::now())
    }
}

/// Map a NewsAPI `/everything` body into normalized articles.
/// `now` fills in a missing or unparseable `publishedAt`.
pub fn parse_articles(body: &str, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let env: Envelope = serde_json::from_str(body).context("parsing newsapi json")?;
    let Some(raw) = env.articles else {
        return Ok(Vec::new());
    };

    Ok(raw
        .into_iter()
        .map(|a| Article {
            headline: normalize_text(a.title.as_deref().unwrap_or_default()),
            description: a
                .description
                .as_deref()
                .map(normalize_text)
                .filter(|d| !d.is_empty()),
            url: a.url.unwrap_or_default(),
            source: a
                .source
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            published_at: a
                .published_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(now),
        })
        .collect())
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_news(&self, date: NaiveDate) -> Vec<Article> {
        match self.try_fetch(date).await {
            Ok(articles) => {
                tracing::debug!(provider = PROVIDER, %date, count = articles.len(), "news fetched");
                articles
            }
            Err(e) => {
                tracing::error!(error = ?e, provider = PROVIDER, %date, "news fetch failed");
                record_provider_error(PROVIDER);
                Vec::new()
            }
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
