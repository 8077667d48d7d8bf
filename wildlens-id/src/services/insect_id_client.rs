//! Remote insect identification API client
//!
//! Wraps the kindwise-style identification service: image submission,
//! result retrieval, knowledge-base name search, account usage, and
//! identification deletion. The upstream schema is snake_case and is
//! converted to the gateway wire contract ([`Candidate`]) here.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wildlens_common::api::{Candidate, GeoTag, LicensedImage};

/// Default base URL of the remote identification service
pub const DEFAULT_SERVICE_URL: &str = "https://insect.kindwise.com/api/v1";

/// Detail fields requested when retrieving identification results
pub const DETAIL_FIELDS: &str = "common_names,url,description,image";

const API_KEY_HEADER: &str = "Api-Key";
const USER_AGENT: &str = "WildLens/0.1.0 (species identification gateway)";

/// Identification client errors
#[derive(Debug, Error)]
pub enum InsectIdError {
    #[error("API key not configured. Set WILDLENS_API_KEY or add api_key to wildlens.toml")]
    MissingApiKey,

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Failed to get results: {0}")]
    FetchFailed(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Failed to get usage info: {0}")]
    UsageFailed(String),

    #[error("Failed to delete: {0}")]
    DeleteFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

// ========================================
// Upstream response schema (snake_case)
// ========================================

/// Response to an image submission
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubmitResponse {
    /// Token naming the identification for later retrieval/deletion
    pub access_token: String,
}

/// Response to an identification retrieval
///
/// The service has returned two shapes over time: the current one nests
/// suggestions under `result.classification`, the legacy one carries a flat
/// `results` array. Both are modeled so either decodes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DetailsResponse {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub result: Option<ClassificationResult>,

    /// Legacy flat shape
    #[serde(default)]
    pub results: Option<Vec<Suggestion>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassificationResult {
    #[serde(default)]
    pub classification: Option<Classification>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Classification {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

/// One ranked suggestion from the remote service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Suggestion {
    #[serde(default)]
    pub id: String,

    /// Scientific name
    #[serde(default)]
    pub name: String,

    /// Match probability in [0.0, 1.0]
    #[serde(default)]
    pub probability: f64,

    #[serde(default)]
    pub details: Option<SuggestionDetails>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SuggestionDetails {
    #[serde(default)]
    pub common_names: Vec<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub description: Option<DetailText>,

    #[serde(default)]
    pub image: Option<DetailImage>,

    #[serde(default)]
    pub images: Vec<DetailImage>,
}

/// Text detail, either bare or wrapped with a citation
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DetailText {
    Plain(String),
    Cited {
        value: String,
        #[serde(default)]
        citation: Option<String>,
    },
}

impl DetailText {
    pub fn into_value(self) -> String {
        match self {
            DetailText::Plain(value) => value,
            DetailText::Cited { value, .. } => value,
        }
    }
}

/// Image detail with license attribution
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetailImage {
    pub value: String,

    #[serde(default)]
    pub citation: Option<String>,

    #[serde(default)]
    pub license_name: Option<String>,

    #[serde(default)]
    pub license_url: Option<String>,
}

/// Account usage response
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct UpstreamUsage {
    #[serde(default)]
    pub remaining_credit: i64,

    #[serde(default)]
    pub total_credit: i64,
}

impl Suggestion {
    /// Convert to the gateway wire representation
    pub fn into_candidate(self) -> Candidate {
        let details = self.details.unwrap_or_default();
        Candidate {
            id: self.id,
            name: self.name,
            common_names: details.common_names,
            probability: self.probability,
            description: details.description.map(DetailText::into_value),
            url: details.url,
            image: details.image.map(|img| img.value),
            images: details
                .images
                .into_iter()
                .map(|img| LicensedImage {
                    url: img.value,
                    license_name: img.license_name,
                    license_url: img.license_url,
                })
                .collect(),
        }
    }
}

/// Suggestions extracted from a [`DetailsResponse`], tagged with the shape
/// they were found in
#[derive(Debug, Clone)]
pub enum ClassificationPayload {
    /// Current shape: `result.classification.suggestions`
    Nested(Vec<Suggestion>),
    /// Legacy shape: flat `results` array
    Flat(Vec<Suggestion>),
    /// Neither shape present
    Empty,
}

impl ClassificationPayload {
    /// Decode with an ordered fallback: nested shape first, then the legacy
    /// flat array, then empty. A `result` without classification data counts
    /// as empty, not as an error.
    pub fn decode(response: DetailsResponse) -> Self {
        if let Some(classification) = response.result.and_then(|r| r.classification) {
            return ClassificationPayload::Nested(classification.suggestions);
        }
        if let Some(results) = response.results {
            return ClassificationPayload::Flat(results);
        }
        ClassificationPayload::Empty
    }

    pub fn shape_name(&self) -> &'static str {
        match self {
            ClassificationPayload::Nested(_) => "nested",
            ClassificationPayload::Flat(_) => "flat",
            ClassificationPayload::Empty => "empty",
        }
    }

    pub fn into_suggestions(self) -> Vec<Suggestion> {
        match self {
            ClassificationPayload::Nested(suggestions) => suggestions,
            ClassificationPayload::Flat(suggestions) => suggestions,
            ClassificationPayload::Empty => Vec::new(),
        }
    }
}

// ========================================
// Client
// ========================================

/// Insect identification API client
#[derive(Clone)]
pub struct InsectIdClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl InsectIdClient {
    /// Create a client for the given service base URL.
    ///
    /// No request timeout is configured; every call waits as long as the
    /// remote analysis takes.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, InsectIdError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| InsectIdError::NetworkError(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            http_client,
            base_url,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// True when an API key is available for upstream calls
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_key(&self) -> Result<&str, InsectIdError> {
        self.api_key.as_deref().ok_or(InsectIdError::MissingApiKey)
    }

    /// Submit an image for identification
    ///
    /// The image bytes are forwarded verbatim as the `images` multipart field;
    /// optional capture metadata rides along as extra text fields.
    pub async fn submit_image(
        &self,
        image: Vec<u8>,
        filename: &str,
        content_type: &str,
        geo: Option<&GeoTag>,
    ) -> Result<SubmitResponse, InsectIdError> {
        let api_key = self.api_key()?;

        let part = reqwest::multipart::Part::bytes(image)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| InsectIdError::ParseError(e.to_string()))?;

        let mut form = reqwest::multipart::Form::new().part("images", part);
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

        tracing::debug!(filename = %filename, "Submitting image to identification service");

        let response = self
            .http_client
            .post(format!("{}/identification", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InsectIdError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsectIdError::UploadFailed(status_text(status)));
        }

        response
            .json()
            .await
            .map_err(|e| InsectIdError::ParseError(e.to_string()))
    }

    /// Retrieve identification results for a previously submitted image
    pub async fn fetch_identification(
        &self,
        access_token: &str,
        details: &str,
    ) -> Result<DetailsResponse, InsectIdError> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(format!("{}/identification/{}", self.base_url, access_token))
            .query(&[("details", details)])
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| InsectIdError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsectIdError::FetchFailed(status_text(status)));
        }

        response
            .json()
            .await
            .map_err(|e| InsectIdError::ParseError(e.to_string()))
    }

    /// Search the service knowledge base by scientific or common name
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Suggestion>, InsectIdError> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(format!("{}/kb/insect/name_search", self.base_url))
            .query(&[("q", term)])
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| InsectIdError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsectIdError::SearchFailed(status_text(status)));
        }

        response
            .json()
            .await
            .map_err(|e| InsectIdError::ParseError(e.to_string()))
    }

    /// Get remaining account credit
    pub async fn usage_info(&self) -> Result<UpstreamUsage, InsectIdError> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .get(format!("{}/usage_info", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| InsectIdError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsectIdError::UsageFailed(status_text(status)));
        }

        response
            .json()
            .await
            .map_err(|e| InsectIdError::ParseError(e.to_string()))
    }

    /// Delete an identification from the remote service
    pub async fn delete_identification(&self, access_token: &str) -> Result<(), InsectIdError> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .delete(format!("{}/identification/{}", self.base_url, access_token))
            .header(API_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(|e| InsectIdError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsectIdError::DeleteFailed(status_text(status)));
        }

        Ok(())
    }
}

/// Human-readable status text ("Forbidden") with the full status line as
/// fallback for codes without a canonical reason
fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}
