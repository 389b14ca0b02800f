// tests/common/mod.rs
//
// Local stand-ins for the third-party APIs: a real axum server on an
// ephemeral port, so providers exercise their actual HTTP path.
#![allow(dead_code)]

use std::time::Duration;

use axum::Router;
use chrono::{DateTime, Utc};
use daily_dashboard::providers::types::Article;

/// Serve `router` on 127.0.0.1:0 and return its base URL.
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}

pub fn client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("test http client")
}

pub fn client() -> reqwest::Client {
    client_with_timeout(Duration::from_secs(5))
}

pub fn article(headline: &str, description: Option<&str>) -> Article {
    Article {
        headline: headline.to_string(),
        description: description.map(str::to_string),
        url: format!("https://example.test/{}", headline.len()),
        source: "Tech News".to_string(),
        published_at: "2025-12-03T10:00:00Z"
            .parse::<DateTime<Utc>>()
            .expect("fixed timestamp"),
    }
}
