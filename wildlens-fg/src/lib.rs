//! # WildLens Field Guide
//!
//! Client-side core of the WildLens species identification flow:
//! - Session state machine (page navigation, upload lifecycle)
//! - Result presentation (candidate records to display cards)
//! - Collection persistence (JSON snapshot on disk)
//! - Gateway HTTP client

pub mod client;
pub mod collection;
pub mod flow;
pub mod view;
