use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::keywords::KeywordTables;
use crate::providers::record_provider_error;
use crate::providers::types::{StockProvider, StockQuote};

const PROVIDER: &str = "Tiingo";

#[derive(Debug, Deserialize)]
struct RawPrice {
    close: Option<f64>,
    last: Option<f64>,
}

pub struct TiingoProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    tables: Arc<KeywordTables>,
}

impl TiingoProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        tables: Arc<KeywordTables>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            tables,
        }
    }

    async fn try_fetch(&self, ticker: &str) -> Result<StockQuote> {
        let resp = self
            .client
            .get(format!("{}/tiingo/daily/{}/prices", self.base_url, ticker))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .query(&[("token", self.api_key.as_str())])
            .send()
            .await
            .context("tiingo http get()")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("tiingo status {status}"));
        }
        let body = resp.text().await.context("tiingo http .text()")?;
        let price = parse_latest_price(&body)?;

        Ok(StockQuote {
            company_name: self.tables.company_name_for(ticker),
            ticker_symbol: ticker.to_string(),
            price,
        })
    }
}

/// Latest price from a `/prices` body: first row, `close` then `last`, else 0.
pub fn parse_latest_price(body: &str) -> Result<f64> {
    let rows: Vec<RawPrice> = serde_json::from_str(body).context("parsing tiingo json")?;
    let latest = rows
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("tiingo returned no price rows"))?;
    Ok(latest.close.or(latest.last).unwrap_or(0.0))
}

#[async_trait]
impl StockProvider for TiingoProvider {
    async fn fetch_quote(&self, ticker: &str) -> Option<StockQuote> {
        match self.try_fetch(ticker).await {
            Ok(q) => Some(q),
            Err(e) => {
                tracing::warn!(error = ?e, provider = PROVIDER, ticker, "stock fetch failed");
                record_provider_error(PROVIDER);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
