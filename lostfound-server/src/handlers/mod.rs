//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.
//! Successful responses share the [`Envelope`] shape; failures are rendered
//! by [`crate::error::ApiError`].

pub mod claims;
pub mod health;
pub mod items;
pub mod users;

use serde::Serialize;
use uuid::Uuid;

pub use crate::state::AppState;
pub use claims::{
    create_claim_handler, get_claim_handler, get_claim_media_handler, list_admin_claims_handler,
    list_claims_handler, verify_claim_handler, AdminClaimQuery,
};
pub use health::{health, ready, HealthResponse, ReadyResponse};
pub use items::{
    create_found_item_handler, create_lost_item_handler, get_found_item_handler,
    get_lost_item_handler, list_found_items_handler, list_lost_items_handler,
};
pub use users::{current_user_handler, sync_user_handler, SyncUserRequest, SyncUserResponse};

use crate::error::ApiError;

/// Success envelope: `{"success": true, "data": ..., "message": ...}`
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

/// Parse an id path segment.
pub(crate) fn path_id(raw: &str, name: &str) -> Result<Uuid, ApiError> {
    Ok(lostfound_core::validation::id_field(Some(raw), name)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_missing_message() {
        let json = serde_json::to_value(Envelope::data(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2]}));

        let json = serde_json::to_value(Envelope::with_message("x", "done")).unwrap();
        assert_eq!(json["message"], "done");
    }

    #[test]
    fn test_path_id_rejects_garbage() {
        let err = path_id("42abc", "Claim ID").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert!(path_id(&Uuid::new_v4().to_string(), "Claim ID").is_ok());
    }
}
