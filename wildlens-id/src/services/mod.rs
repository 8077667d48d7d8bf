//! Remote service clients for wildlens-id

pub mod insect_id_client;

pub use insect_id_client::{
    ClassificationPayload, InsectIdClient, InsectIdError, Suggestion, DEFAULT_SERVICE_URL,
    DETAIL_FIELDS,
};
