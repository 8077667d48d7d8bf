//! Identification gateway HTTP client
//!
//! Thin client for the local wildlens-id gateway. Gateway rejections are
//! surfaced with the message from the `{"error": ...}` body so the flow can
//! display exactly what the gateway said.

use thiserror::Error;
use wildlens_common::api::{
    Candidate, ErrorBody, GeoTag, IdentifyResponse, SearchResponse, UsageInfo, UsageResponse,
};

/// Default gateway base URL (wildlens-id on its standard port)
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:5741";

/// Environment variable overriding the gateway base URL
pub const GATEWAY_URL_ENV: &str = "WILDLENS_GATEWAY_URL";

/// Shown when an identify rejection carries no readable message
pub const GENERIC_IDENTIFY_ERROR: &str = "Failed to identify species. Please try again.";

const USER_AGENT: &str = "WildLens/0.1.0 (field guide)";

/// Gateway client errors
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached at all
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The gateway answered with an error status; the message is its
    /// `{"error": ...}` body when readable
    #[error("{0}")]
    Rejected(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Client for the local identification gateway
pub struct GatewayClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a client for the given gateway base URL.
    ///
    /// Like the gateway itself, no request timeout is configured;
    /// identification takes as long as the remote analysis takes.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /api/identify with the image as a multipart field
    pub async fn identify(
        &self,
        image: Vec<u8>,
        filename: &str,
        content_type: &str,
        geo: Option<&GeoTag>,
    ) -> Result<IdentifyResponse, GatewayError> {
        let part = reqwest::multipart::Part::bytes(image)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| GatewayError::ParseError(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().part("image", part);
        if let Some(geo) = geo {
            if let Some(latitude) = geo.latitude {
                form = form.text("latitude", latitude.to_string());
            }
            if let Some(longitude) = geo.longitude {
                form = form.text("longitude", longitude.to_string());
            }
            if let Some(datetime) = &geo.datetime {
                form = form.text("datetime", datetime.clone());
            }
        }

        let response = self
            .http_client
            .post(format!("{}/api/identify", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response, GENERIC_IDENTIFY_ERROR).await);
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::ParseError(e.to_string()))
    }

    /// GET /api/search?q=term
    pub async fn search(&self, term: &str) -> Result<Vec<Candidate>, GatewayError> {
        let response = self
            .http_client
            .get(format!("{}/api/search", self.base_url))
            .query(&[("q", term)])
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response, "Search failed. Please try again.").await);
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ParseError(e.to_string()))?;
        Ok(body.results)
    }

    /// GET /api/usage
    pub async fn usage(&self) -> Result<UsageInfo, GatewayError> {
        let response = self
            .http_client
            .get(format!("{}/api/usage", self.base_url))
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to get usage info.").await);
        }

        let body: UsageResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ParseError(e.to_string()))?;
        Ok(body.usage)
    }
}

/// Turn a non-success response into a rejection, preferring the body's
/// error message over the generic fallback
async fn rejection(response: reqwest::Response, fallback: &str) -> GatewayError {
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .map(|body| body.error)
        .filter(|error| !error.is_empty())
        .unwrap_or_else(|| fallback.to_string());

    GatewayError::Rejected(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GatewayClient::new(DEFAULT_GATEWAY_URL);
        assert!(client.is_ok());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = GatewayClient::new("http://127.0.0.1:5741/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5741");
    }
}
