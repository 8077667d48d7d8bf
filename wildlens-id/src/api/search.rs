//! Knowledge-base name search endpoint

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::debug;
use wildlens_common::api::{Candidate, SearchResponse};

use crate::services::Suggestion;
use crate::{ApiError, ApiResult, AppState};

/// Query parameters for name search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Scientific or common name fragment
    #[serde(default)]
    pub q: Option<String>,
}

/// GET /api/search?q=term
///
/// Searches the remote knowledge base by name. A missing or blank `q` is a
/// 400 before any upstream traffic.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let term = params.q.unwrap_or_default();
    let term = term.trim();
    if term.is_empty() {
        return Err(ApiError::BadRequest("Search query required".to_string()));
    }

    let matches = state.identifier.search_by_name(term).await?;
    debug!(term = %term, count = matches.len(), "Name search complete");

    let results: Vec<Candidate> = matches.into_iter().map(Suggestion::into_candidate).collect();

    Ok(Json(SearchResponse {
        success: true,
        results,
    }))
}

/// Build search routes
pub fn search_routes() -> Router<AppState> {
    Router::new().route("/api/search", get(search))
}
