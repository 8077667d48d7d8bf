//! Integration tests for the gateway client
//!
//! Each test runs a mock gateway on an ephemeral loopback port and points a
//! real `GatewayClient` at it, so request shape (multipart field names, query
//! params) and response handling are exercised end to end.

use std::collections::HashMap;

use axum::extract::{Multipart, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use wildlens_common::api::GeoTag;
use wildlens_fg::client::{GatewayClient, GatewayError, GENERIC_IDENTIFY_ERROR};

const IMAGE_BYTES: &[u8] = b"fake-jpeg-bytes";

/// Test helper: Bind a mock gateway on an ephemeral port
async fn spawn_gateway(app: Router) -> GatewayClient {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Should bind ephemeral port");
    let addr = listener.local_addr().expect("Should read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Gateway serve failed");
    });
    GatewayClient::new(format!("http://{addr}")).expect("Should create client")
}

/// Mock identify endpoint that checks the upload shape including geo fields
async fn identify_with_geo(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    let mut image = Vec::new();
    let mut filename = String::new();
    let mut latitude = String::new();
    let mut datetime = String::new();

    while let Some(field) = multipart.next_field().await.expect("Should read field") {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                filename = field.file_name().unwrap_or_default().to_string();
                image = field.bytes().await.expect("Should read bytes").to_vec();
            }
            "latitude" => latitude = field.text().await.expect("Should read text"),
            "datetime" => datetime = field.text().await.expect("Should read text"),
            _ => {}
        }
    }

    if image != IMAGE_BYTES
        || filename != "leaf.jpg"
        || latitude != "35.6"
        || datetime != "2026-01-05T12:00:00Z"
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unexpected upload"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "accessToken": "tok-1",
            "results": [{
                "id": "ec5eb64f2a24b2cd",
                "name": "Papilio polytes",
                "commonNames": ["Common Mormon"],
                "probability": 0.944
            }]
        })),
    )
}

/// Mock identify endpoint that rejects any field other than the image
async fn identify_image_only(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
    let mut has_image = false;
    let mut stray = Vec::new();

    while let Some(field) = multipart.next_field().await.expect("Should read field") {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            has_image = true;
            let _ = field.bytes().await.expect("Should read bytes");
        } else {
            stray.push(name);
        }
    }

    if !has_image || !stray.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unexpected upload"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({"success": true, "accessToken": "tok-2", "results": []})),
    )
}

async fn search_handler(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if params.get("q").map(String::as_str) != Some("monarch") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Search query required"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "results": [{
                "id": "danaus-plexippus",
                "name": "Danaus plexippus",
                "commonNames": ["Monarch Butterfly"],
                "probability": 0.0
            }]
        })),
    )
}

#[tokio::test]
async fn test_identify_parses_ranked_results() {
    let app = Router::new().route("/api/identify", post(identify_with_geo));
    let client = spawn_gateway(app).await;

    let geo = GeoTag {
        latitude: Some(35.6),
        longitude: None,
        datetime: Some("2026-01-05T12:00:00Z".to_string()),
    };
    let response = client
        .identify(IMAGE_BYTES.to_vec(), "leaf.jpg", "image/jpeg", Some(&geo))
        .await
        .expect("Identify should succeed");

    assert!(response.success);
    assert_eq!(response.access_token, "tok-1");
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].name, "Papilio polytes");
    assert_eq!(response.results[0].common_names, vec!["Common Mormon"]);
    assert!((response.results[0].probability - 0.944).abs() < 1e-9);
}

#[tokio::test]
async fn test_identify_without_geo_sends_only_the_image() {
    let app = Router::new().route("/api/identify", post(identify_image_only));
    let client = spawn_gateway(app).await;

    let response = client
        .identify(IMAGE_BYTES.to_vec(), "leaf.jpg", "image/jpeg", None)
        .await
        .expect("Identify should succeed");

    assert!(response.success);
    assert!(response.results.is_empty());
}

#[tokio::test]
async fn test_identify_surfaces_gateway_error_message() {
    let app = Router::new().route(
        "/api/identify",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "No image provided"})),
            )
        }),
    );
    let client = spawn_gateway(app).await;

    let error = client
        .identify(IMAGE_BYTES.to_vec(), "leaf.jpg", "image/jpeg", None)
        .await
        .expect_err("Identify should fail");

    match error {
        GatewayError::Rejected(message) => assert_eq!(message, "No image provided"),
        other => panic!("Expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_identify_falls_back_to_generic_message() {
    // Body is not the error shape, so the client substitutes its fallback
    let app = Router::new().route(
        "/api/identify",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let client = spawn_gateway(app).await;

    let error = client
        .identify(IMAGE_BYTES.to_vec(), "leaf.jpg", "image/jpeg", None)
        .await
        .expect_err("Identify should fail");

    match error {
        GatewayError::Rejected(message) => assert_eq!(message, GENERIC_IDENTIFY_ERROR),
        other => panic!("Expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_returns_candidates() {
    let app = Router::new().route("/api/search", get(search_handler));
    let client = spawn_gateway(app).await;

    let candidates = client.search("monarch").await.expect("Search should succeed");

    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].name, "Danaus plexippus");
    assert_eq!(candidates[0].common_names, vec!["Monarch Butterfly"]);
}

#[tokio::test]
async fn test_search_rejection_uses_server_message() {
    let app = Router::new().route(
        "/api/search",
        get(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({"error": "Search failed: Forbidden"})),
            )
        }),
    );
    let client = spawn_gateway(app).await;

    let error = client.search("monarch").await.expect_err("Search should fail");

    match error {
        GatewayError::Rejected(message) => assert_eq!(message, "Search failed: Forbidden"),
        other => panic!("Expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_usage_reports_credits() {
    let app = Router::new().route(
        "/api/usage",
        get(|| async {
            Json(json!({
                "success": true,
                "usage": {"remainingCredit": 93, "totalCredit": 100}
            }))
        }),
    );
    let client = spawn_gateway(app).await;

    let usage = client.usage().await.expect("Usage should succeed");

    assert_eq!(usage.remaining_credit, 93);
    assert_eq!(usage.total_credit, 100);
}

#[tokio::test]
async fn test_unreachable_gateway_is_a_network_error() {
    // Bind then drop to get a loopback port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = GatewayClient::new(format!("http://{addr}")).unwrap();
    let error = client.usage().await.expect_err("Usage should fail");

    assert!(matches!(error, GatewayError::NetworkError(_)));
}
