//! OpenAPI documentation configuration
//!
//! Generates the OpenAPI 3.0 document served at `/api-docs/openapi.json`.

use lostfound_core::{
    ClaimDecision, ClaimMediaView, ClaimStatus, ClaimView, ItemKind, ItemStatus, ItemView,
    MediaKind, MediaView, Role, User,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{HealthResponse, ReadyResponse, SyncUserRequest, SyncUserResponse};

/// Lost & Found Ledger API - OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lost & Found Ledger API",
        version = "0.1.0",
        description = r#"
## Lost and found item tracking with verified claims

Users report **lost** or **found** items and file **claims** with proof media.
Administrators verify claims:

1. `pending` claims move to `verified`, `returned` or `rejected`
2. `verified` claims can still be marked `returned`
3. A verified claim marks its item `claimed`; a returned claim closes it

Public reads only expose blurred previews of proof media. The original files
are available to administrators through `GET /api/claims/{claim_id}/media`.

Every response is wrapped in `{"success": true, "data": ..., "message": ...}`
or `{"success": false, "error": ..., "code": ...}`.
"#,
        license(name = "MIT OR Apache-2.0")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development server")
    ),
    tags(
        (name = "Items", description = "Lost and found item reports"),
        (name = "Claims", description = "Claims against items and their verification"),
        (name = "Users", description = "User records synced from the credential service"),
        (name = "Health", description = "Service health and readiness endpoints")
    ),
    paths(
        crate::handlers::health::health,
        crate::handlers::health::ready,
        crate::handlers::users::sync_user_handler,
        crate::handlers::users::current_user_handler,
        crate::handlers::items::create_lost_item_handler,
        crate::handlers::items::list_lost_items_handler,
        crate::handlers::items::get_lost_item_handler,
        crate::handlers::items::create_found_item_handler,
        crate::handlers::items::list_found_items_handler,
        crate::handlers::items::get_found_item_handler,
        crate::handlers::claims::create_claim_handler,
        crate::handlers::claims::list_claims_handler,
        crate::handlers::claims::list_admin_claims_handler,
        crate::handlers::claims::get_claim_handler,
        crate::handlers::claims::verify_claim_handler,
        crate::handlers::claims::get_claim_media_handler,
    ),
    components(
        schemas(
            HealthResponse,
            ReadyResponse,
            SyncUserRequest,
            SyncUserResponse,
            User,
            Role,
            ItemView,
            ItemKind,
            ItemStatus,
            ClaimView,
            ClaimStatus,
            ClaimDecision,
            ClaimMediaView,
            MediaView,
            MediaKind,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_claim_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/claims"));
        assert!(doc.paths.paths.contains_key("/api/claims/{claim_id}/verify"));
        assert!(doc.paths.paths.contains_key("/api/items/found/{item_id}"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_token"));
    }
}
