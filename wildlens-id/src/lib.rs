//! wildlens-id library interface
//!
//! Exposes the router and state for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::InsectIdClient;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Remote identification service client
    pub identifier: InsectIdClient,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(identifier: InsectIdClient) -> Self {
        Self {
            identifier,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::identify_routes())
        .merge(api::search_routes())
        .merge(api::usage_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Enable CORS for local browser clients
        .layer(CorsLayer::permissive())
}
