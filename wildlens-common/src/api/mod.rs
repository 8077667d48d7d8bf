//! API module for the shared HTTP wire contract
//!
//! Contains the request/response types exchanged between the identification
//! gateway (wildlens-id) and its clients (wildlens-fg). Pure data types only;
//! each binary wraps these with its own framework-specific handling.

pub mod types;

pub use types::{
    Candidate, ErrorBody, GeoTag, IdentifyResponse, LicensedImage, SearchResponse, UsageInfo,
    UsageResponse,
};
