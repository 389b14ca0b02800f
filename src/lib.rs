// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod keywords;
pub mod metrics;
pub mod providers;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::aggregator::{Aggregator, DashboardData};
pub use crate::api::{router, AppState};
