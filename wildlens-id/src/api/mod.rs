//! HTTP API handlers for wildlens-id
//!
//! One file per endpoint; each exports a `*_routes()` builder merged by
//! [`crate::build_router`].

pub mod health;
pub mod identify;
pub mod search;
pub mod usage;

pub use health::health_routes;
pub use identify::identify_routes;
pub use search::search_routes;
pub use usage::usage_routes;
