//! Image identification endpoint
//!
//! Accepts a multipart photo upload, forwards it to the remote identification
//! service, and returns ranked species candidates in the gateway wire format.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};
use tracing::{debug, info, warn};
use wildlens_common::api::{Candidate, GeoTag, IdentifyResponse};

use crate::services::{ClassificationPayload, Suggestion, DETAIL_FIELDS};
use crate::{ApiError, ApiResult, AppState};

/// Request body cap; phone photos arrive uncompressed
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// One image field pulled out of the multipart body
#[derive(Debug)]
struct ImageUpload {
    data: Vec<u8>,
    filename: String,
    content_type: String,
}

/// POST /api/identify
///
/// Multipart fields: `image` (required), `latitude`, `longitude`, `datetime`
/// (optional). Field order does not matter. Responds with
/// `{success, accessToken, results}` on success.
pub async fn identify(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<IdentifyResponse>> {
    let mut image: Option<ImageUpload> = None;
    let mut geo = GeoTag::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read image field: {e}")))?;
                image = Some(ImageUpload {
                    data: data.to_vec(),
                    filename,
                    content_type,
                });
            }
            "latitude" => {
                geo.latitude = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            "longitude" => {
                geo.longitude = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            "datetime" => {
                geo.datetime = field.text().await.ok().filter(|v| !v.trim().is_empty());
            }
            _ => {
                // Unknown fields are ignored
            }
        }
    }

    let Some(image) = image else {
        warn!("Identify request without an image field");
        return Err(ApiError::BadRequest("No image provided".to_string()));
    };

    // Reject before any upstream traffic when no credential is available
    if !state.identifier.is_configured() {
        warn!("Identify request rejected: no API key configured");
        return Err(crate::services::InsectIdError::MissingApiKey.into());
    }

    info!(
        filename = %image.filename,
        content_type = %image.content_type,
        size_bytes = image.data.len(),
        "Received image for identification"
    );

    let geo = (!geo.is_empty()).then_some(&geo);
    let submitted = state
        .identifier
        .submit_image(image.data, &image.filename, &image.content_type, geo)
        .await?;
    let access_token = submitted.access_token;
    let token_prefix: String = access_token.chars().take(20).collect();
    debug!(%token_prefix, "Image accepted by identification service");

    let details = state
        .identifier
        .fetch_identification(&access_token, DETAIL_FIELDS)
        .await?;

    let payload = ClassificationPayload::decode(details);
    if matches!(payload, ClassificationPayload::Flat(_)) {
        warn!("Identification service returned legacy flat results shape");
    }

    let results: Vec<Candidate> = payload
        .into_suggestions()
        .into_iter()
        .map(Suggestion::into_candidate)
        .collect();

    info!(matches = results.len(), "Identification complete");

    Ok(Json(IdentifyResponse {
        success: true,
        access_token,
        results,
    }))
}

/// Build identify routes
pub fn identify_routes() -> Router<AppState> {
    Router::new()
        .route("/api/identify", post(identify))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
