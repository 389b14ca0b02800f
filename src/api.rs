use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{Days, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::aggregator::{Aggregator, DashboardData};
use crate::config::AppConfig;
use crate::keywords::{KeywordMatcher, KeywordTables};
use crate::providers::{
    build_http_client, newsapi::NewsApiProvider, openweather::OpenWeatherProvider,
    tiingo::TiingoProvider,
};
use crate::store::{MemoryStore, Store};

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    http: reqwest::Client,
    tables: Arc<KeywordTables>,
    matcher: Arc<KeywordMatcher>,
    store: Arc<dyn Store>,
}

impl AppState {
    pub fn new(config: AppConfig, tables: KeywordTables, store: Arc<dyn Store>) -> Result<Self> {
        let http = build_http_client(&config)?;
        let matcher = Arc::new(KeywordMatcher::new(&tables));
        Ok(Self {
            config: Arc::new(config),
            http,
            tables: Arc::new(tables),
            matcher,
            store,
        })
    }

    /// Env config + keyword tables from disk (or built-in) + in-memory store.
    pub fn from_env() -> Result<Self> {
        let config = AppConfig::from_env()?;
        let tables = KeywordTables::load_default()?;
        Self::new(config, tables, Arc::new(MemoryStore::new()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// Fresh providers per request: the weather cache lives exactly as long
    /// as one aggregation.
    pub fn aggregator(&self) -> Aggregator {
        let cfg = &self.config;
        Aggregator::new(
            Box::new(NewsApiProvider::new(
                self.http.clone(),
                &cfg.news_api_base_url,
                &cfg.news_api_key,
            )),
            Box::new(OpenWeatherProvider::new(
                self.http.clone(),
                &cfg.openweather_base_url,
                &cfg.openweather_api_key,
            )),
            Box::new(TiingoProvider::new(
                self.http.clone(),
                &cfg.tiingo_base_url,
                &cfg.tiingo_api_key,
                Arc::clone(&self.tables),
            )),
            Arc::clone(&self.matcher),
            Arc::clone(&self.store),
        )
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/dashboard", get(dashboard_today))
        .route("/api/dashboard/{date}", get(dashboard_for_date))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "message": self.message }))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        tracing::error!(error = ?e, "dashboard request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Failed to load dashboard data.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateOption {
    pub label: String, // "Wed Dec 03, 2025"
    pub value: String, // "2025-12-03"
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub date: String, // "Dec 03, 2025"
    pub date_param: String,
    #[serde(flatten)]
    pub data: DashboardData,
    pub available_dates: Vec<DateOption>,
    pub last_updated: String,
}

/// Parse `YYYY-MM-DD` and require it to fall within the last `window_days`
/// days, today included.
pub fn validate_dashboard_date(
    raw: &str,
    today: NaiveDate,
    window_days: u32,
) -> Result<NaiveDate, ApiError> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("Invalid date format."))?;

    let oldest = today
        .checked_sub_days(Days::new(u64::from(window_days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN);
    if date < oldest || date > today {
        return Err(ApiError::bad_request(format!(
            "We can only show data from the last {window_days} days."
        )));
    }
    Ok(date)
}

/// Today first, then each earlier day in the window.
pub fn available_dates(today: NaiveDate, window_days: u32) -> Vec<DateOption> {
    (0..u64::from(window_days))
        .filter_map(|i| today.checked_sub_days(Days::new(i)))
        .map(|d| DateOption {
            label: d.format("%a %b %d, %Y").to_string(),
            value: d.format("%Y-%m-%d").to_string(),
        })
        .collect()
}

async fn dashboard_today(State(state): State<AppState>) -> Result<Json<DashboardResponse>, ApiError> {
    let today = Utc::now().date_naive();
    render(&state, today, today).await
}

async fn dashboard_for_date(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let today = Utc::now().date_naive();
    let date = validate_dashboard_date(&raw, today, state.config.window_days)?;
    render(&state, date, today).await
}

async fn render(
    state: &AppState,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Json<DashboardResponse>, ApiError> {
    let data = state.aggregator().aggregate_data(date).await?;
    Ok(Json(DashboardResponse {
        date: date.format("%b %d, %Y").to_string(),
        date_param: date.format("%Y-%m-%d").to_string(),
        data,
        available_dates: available_dates(today, state.config.window_days),
        last_updated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}
