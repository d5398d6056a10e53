//! Claim handlers
//!
//! Claims are filed by authenticated users with proof media and decided by
//! administrators. Public reads only ever expose blurred previews; the
//! original proof is served by the admin-only media endpoint.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, Request, State,
    },
    http::StatusCode,
    Json,
};
use lostfound_core::{ClaimDecision, ClaimMediaView, ClaimQuery, ClaimView};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::auth::{AuthenticatedUser, Caller};
use crate::error::ApiError;
use crate::handlers::{path_id, AppState, Envelope};
use crate::multipart::{SubmissionForm, CLAIM_FILE_FIELDS};

/// Query parameters for the administrator listing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminClaimQuery {
    /// pending, verified, returned or rejected
    pub status: Option<String>,
}

/// File a claim against a lost or found item
///
/// Accepts `multipart/form-data` with `item_type`, `item_id`, optional
/// `verification_details` and at least one proof file (`proof_images`,
/// `proof_media` or `proof_video`).
#[utoipa::path(
    post,
    path = "/api/claims",
    tag = "Claims",
    responses(
        (status = 201, description = "Claim created (wrapped in the success envelope)", body = ClaimView),
        (status = 400, description = "Validation failure, item unavailable, duplicate pending claim or upload failure"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Item or user not found")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_claim_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    req: Request,
) -> Result<(StatusCode, Json<Envelope<ClaimView>>), ApiError> {
    let form =
        SubmissionForm::extract(req, &state, CLAIM_FILE_FIELDS, state.max_file_size).await?;
    let view = state
        .claims
        .create_claim(user.user.id, form.into_claim_submission())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(view, "Claim submitted successfully")),
    ))
}

/// List claims, newest first
#[utoipa::path(
    get,
    path = "/api/claims",
    tag = "Claims",
    params(ClaimQuery),
    responses(
        (status = 200, description = "Matching claims", body = [ClaimView]),
        (status = 400, description = "Invalid filter"),
        (status = 404, description = "User not found")
    )
)]
pub async fn list_claims_handler(
    State(state): State<AppState>,
    query: Result<Query<ClaimQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<ClaimView>>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let views = state.claims.list_claims(query).await?;
    Ok(Json(Envelope::data(views)))
}

/// List every claim (administrators)
#[utoipa::path(
    get,
    path = "/api/claims/admin",
    tag = "Claims",
    params(AdminClaimQuery),
    responses(
        (status = 200, description = "All claims", body = [ClaimView]),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin privileges required")
    ),
    security(("bearer_token" = []))
)]
pub async fn list_admin_claims_handler(
    State(state): State<AppState>,
    Caller(access): Caller,
    query: Result<Query<AdminClaimQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<ClaimView>>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let views = state
        .claims
        .list_all_claims(&access, query.status.as_deref())
        .await?;
    Ok(Json(Envelope::data(views)))
}

#[utoipa::path(
    get,
    path = "/api/claims/{claim_id}",
    tag = "Claims",
    params(("claim_id" = String, Path, description = "Claim id")),
    responses(
        (status = 200, description = "Claim", body = ClaimView),
        (status = 404, description = "Claim not found")
    )
)]
pub async fn get_claim_handler(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> Result<Json<Envelope<ClaimView>>, ApiError> {
    let claim_id = path_id(&claim_id, "Claim ID")?;
    let view = state.claims.get_claim(claim_id).await?;
    Ok(Json(Envelope::data(view)))
}

/// Decide a claim (administrators)
///
/// `verified` marks the item claimed, `returned` closes it, `rejected`
/// leaves it untouched.
#[utoipa::path(
    put,
    path = "/api/claims/{claim_id}/verify",
    tag = "Claims",
    params(("claim_id" = String, Path, description = "Claim id")),
    request_body = ClaimDecision,
    responses(
        (status = 200, description = "Claim updated", body = ClaimView),
        (status = 400, description = "Invalid status or illegal transition"),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Claim or associated item not found")
    ),
    security(("bearer_token" = []))
)]
pub async fn verify_claim_handler(
    State(state): State<AppState>,
    Caller(access): Caller,
    Path(claim_id): Path<String>,
    body: Result<Json<ClaimDecision>, JsonRejection>,
) -> Result<Json<Envelope<ClaimView>>, ApiError> {
    // Role first, so anonymous callers learn nothing about the body or id
    access.require_admin()?;
    let claim_id = path_id(&claim_id, "Claim ID")?;
    let Json(decision) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let view = state
        .claims
        .verify_claim(&access, claim_id, decision)
        .await?;
    let message = format!("Claim {} successfully", view.status);
    Ok(Json(Envelope::with_message(view, message)))
}

/// Original proof and item media (administrators)
#[utoipa::path(
    get,
    path = "/api/claims/{claim_id}/media",
    tag = "Claims",
    params(("claim_id" = String, Path, description = "Claim id")),
    responses(
        (status = 200, description = "Claim and item with original media URLs", body = ClaimMediaView),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Claim or associated item not found")
    ),
    security(("bearer_token" = []))
)]
pub async fn get_claim_media_handler(
    State(state): State<AppState>,
    Caller(access): Caller,
    Path(claim_id): Path<String>,
) -> Result<Json<Envelope<ClaimMediaView>>, ApiError> {
    access.require_admin()?;
    let claim_id = path_id(&claim_id, "Claim ID")?;
    let view = state.claims.get_claim_media(&access, claim_id).await?;
    Ok(Json(Envelope::data(view)))
}
