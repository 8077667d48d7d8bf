//! # WildLens Common Library
//!
//! Shared code for the WildLens services including:
//! - API request/response types (the gateway wire contract)
//! - Configuration loading
//! - Common error types

pub mod api;
pub mod config;
pub mod error;

pub use error::{Error, Result};
