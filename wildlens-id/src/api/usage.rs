//! Account usage endpoint

use axum::{extract::State, routing::get, Json, Router};
use wildlens_common::api::{UsageInfo, UsageResponse};

use crate::{ApiResult, AppState};

/// GET /api/usage
///
/// Reports remaining and total credit on the remote service account,
/// wrapped as `{success, usage}`.
pub async fn usage(State(state): State<AppState>) -> ApiResult<Json<UsageResponse>> {
    let balance = state.identifier.usage_info().await?;

    Ok(Json(UsageResponse {
        success: true,
        usage: UsageInfo {
            remaining_credit: balance.remaining_credit,
            total_credit: balance.total_credit,
        },
    }))
}

/// Build usage routes
pub fn usage_routes() -> Router<AppState> {
    Router::new().route("/api/usage", get(usage))
}
