//! User synchronization handlers
//!
//! The credential service owns sign-up and sign-in. After sign-in the client
//! calls `/api/users/sync` so the ledger has a user record for the token
//! subject.

use axum::{body::Bytes, extract::State, Json};
use lostfound_core::{validation, UpsertUser, User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{AuthenticatedUser, TokenIdentity};
use crate::error::ApiError;
use crate::handlers::{AppState, Envelope};

const EMAIL_MAX: usize = 255;
const NAME_MAX: usize = 100;

/// Optional profile fields; token claims are used when absent. A body email
/// must match the token's email claim when the token carries one.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SyncUserRequest {
    #[serde(default)]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
}

/// Response for user sync
#[derive(Debug, Serialize, ToSchema)]
pub struct SyncUserResponse {
    /// Whether a new user was created (vs updated)
    pub created: bool,
    pub user: User,
}

fn parse_sync_body(body: &[u8]) -> Result<SyncUserRequest, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SyncUserRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {}", e)))
}

fn normalize_email(raw: Option<&str>) -> Result<String, ApiError> {
    let email = validation::required_field(raw, "Email", 1, EMAIL_MAX)?;

    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid {
        return Err(ApiError::bad_request("Invalid email format"));
    }
    Ok(email.to_lowercase())
}

/// Email to store for the caller, and whether it is vouched for by the token.
///
/// A token `email` claim wins; a body email must then match it. Without the
/// claim the body email is stored but never counts as verified.
fn resolve_email(body: Option<String>, token: Option<String>) -> Result<(String, bool), ApiError> {
    match token {
        Some(claim) => {
            let email = normalize_email(Some(&claim))?;
            if let Some(body) = body.as_deref().filter(|b| !b.trim().is_empty()) {
                if normalize_email(Some(body))? != email {
                    return Err(ApiError::bad_request(
                        "Email does not match the signed-in account",
                    ));
                }
            }
            Ok((email, true))
        }
        None => Ok((normalize_email(body.as_deref())?, false)),
    }
}

/// Create or refresh the caller's user record
///
/// Uses upsert semantics. The role becomes `admin` when the token's email
/// claim is on the configured administrator list; an existing admin is never
/// demoted.
#[utoipa::path(
    post,
    path = "/api/users/sync",
    tag = "Users",
    request_body = SyncUserRequest,
    responses(
        (status = 200, description = "User synced (wrapped in the success envelope)", body = SyncUserResponse),
        (status = 400, description = "Missing or invalid email"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_token" = []))
)]
pub async fn sync_user_handler(
    State(state): State<AppState>,
    identity: TokenIdentity,
    body: Bytes,
) -> Result<Json<Envelope<SyncUserResponse>>, ApiError> {
    let request = parse_sync_body(&body)?;
    let (email, verified) = resolve_email(request.email, identity.email)?;
    let name = validation::string_field(
        request.name.or(identity.name).as_deref(),
        "Name",
        0,
        NAME_MAX,
        false,
    )?;

    let created = state
        .store
        .find_user(identity.user_id)
        .await
        .map_err(lostfound_core::LedgerError::from)?
        .is_none();

    // Only a token-issued email can carry the administrator role
    let grant_admin = verified && state.is_admin_email(&email);
    let user = state
        .store
        .upsert_user(UpsertUser {
            id: identity.user_id,
            email,
            name,
            grant_admin,
        })
        .await
        .map_err(lostfound_core::LedgerError::from)?;

    tracing::info!(user_id = %user.id, role = %user.role, created, "User synced");

    Ok(Json(Envelope::with_message(
        SyncUserResponse { created, user },
        if created { "User created" } else { "User updated" },
    )))
}

/// Get current user profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    responses(
        (status = 200, description = "Current user profile", body = User),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_token" = []))
)]
pub async fn current_user_handler(user: AuthenticatedUser) -> Json<Envelope<User>> {
    Json(Envelope::data(user.user))
}
