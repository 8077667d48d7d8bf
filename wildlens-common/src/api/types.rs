//! Shared API request/response types
//!
//! The wire contract of the identification gateway. All JSON bodies use
//! camelCase field names; clients written against the gateway never see the
//! remote service's snake_case schema.

use serde::{Deserialize, Serialize};

// ========================================
// Identification Types
// ========================================

/// One ranked species candidate returned by the gateway
///
/// Fields the remote service may omit are defaulted so partial records
/// deserialize cleanly; presentation code supplies the user-facing fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Stable identifier assigned by the remote service
    #[serde(default)]
    pub id: String,

    /// Scientific (latin) name
    #[serde(default)]
    pub name: String,

    /// Vernacular names, best first
    #[serde(default)]
    pub common_names: Vec<String>,

    /// Match probability in [0.0, 1.0]
    #[serde(default)]
    pub probability: f64,

    /// Prose description of the species (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reference URL for further reading (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Primary illustrative image URL (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Additional reference images with license attribution
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<LicensedImage>,
}

/// Reference image with its license attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensedImage {
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
}

/// Optional capture metadata attached to an identification request
///
/// Sent as extra multipart fields alongside the image; all fields may be
/// omitted independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoTag {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Capture timestamp as an RFC 3339 string
    pub datetime: Option<String>,
}

impl GeoTag {
    /// True when no metadata field is set
    pub fn is_empty(&self) -> bool {
        self.latitude.is_none() && self.longitude.is_none() && self.datetime.is_none()
    }
}

// ========================================
// Response Envelopes
// ========================================

/// Successful response from `POST /api/identify`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResponse {
    /// Always true on the success path
    pub success: bool,

    /// Token naming the identification on the remote service
    pub access_token: String,

    /// Ranked candidates, best match first (may be empty)
    #[serde(default)]
    pub results: Vec<Candidate>,
}

/// Successful response from `GET /api/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,

    #[serde(default)]
    pub results: Vec<Candidate>,
}

/// Successful response from `GET /api/usage`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageResponse {
    pub success: bool,
    pub usage: UsageInfo,
}

/// Account credit balance on the remote service
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInfo {
    pub remaining_credit: i64,
    pub total_credit: i64,
}

/// Error response body used by every gateway endpoint
///
/// All failures serialize as `{"error": "<message>"}` with an appropriate
/// HTTP status code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// ========================================
// Tests
// ========================================
