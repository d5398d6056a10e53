//! Lost and found item handlers
//!
//! Creation requires an authenticated user; listing and lookup are public and
//! only ever expose blurred media previews.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use lostfound_core::{ItemKind, ItemQuery, ItemView};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::handlers::{path_id, AppState, Envelope};
use crate::multipart::{SubmissionForm, ITEM_FILE_FIELDS};

async fn create_item(
    state: AppState,
    user: AuthenticatedUser,
    kind: ItemKind,
    req: Request,
) -> Result<(StatusCode, Json<Envelope<ItemView>>), ApiError> {
    let form = SubmissionForm::extract(req, &state, ITEM_FILE_FIELDS, state.max_file_size).await?;
    let (draft, uploads) = form.into_item_draft();

    let view = match kind {
        ItemKind::Lost => {
            state
                .items
                .create_lost_item(user.user.id, draft, uploads)
                .await?
        }
        ItemKind::Found => {
            state
                .items
                .create_found_item(user.user.id, draft, uploads)
                .await?
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            view,
            format!("{} item reported successfully", kind.label()),
        )),
    ))
}

async fn get_item(state: AppState, kind: ItemKind, raw_id: &str) -> Result<Json<Envelope<ItemView>>, ApiError> {
    let id = path_id(raw_id, "Item ID")?;
    let view = state
        .items
        .get_item(kind, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} item not found", kind.label())))?;
    Ok(Json(Envelope::data(view)))
}

async fn list_items(
    state: AppState,
    kind: ItemKind,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<ItemView>>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let views = state.items.list_items(kind, query).await?;
    Ok(Json(Envelope::data(views)))
}

/// Report a lost item
///
/// Accepts `multipart/form-data` (text fields plus `images`/`image` and
/// `video` files) or a JSON object of text fields.
#[utoipa::path(
    post,
    path = "/api/items/lost",
    tag = "Items",
    responses(
        (status = 201, description = "Item created (wrapped in the success envelope)", body = ItemView),
        (status = 400, description = "Validation or upload failure"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_lost_item_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    req: Request,
) -> Result<(StatusCode, Json<Envelope<ItemView>>), ApiError> {
    create_item(state, user, ItemKind::Lost, req).await
}

/// Report a found item
#[utoipa::path(
    post,
    path = "/api/items/found",
    tag = "Items",
    responses(
        (status = 201, description = "Item created (wrapped in the success envelope)", body = ItemView),
        (status = 400, description = "Validation or upload failure"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_token" = []))
)]
pub async fn create_found_item_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    req: Request,
) -> Result<(StatusCode, Json<Envelope<ItemView>>), ApiError> {
    create_item(state, user, ItemKind::Found, req).await
}

/// List lost items, newest first
#[utoipa::path(
    get,
    path = "/api/items/lost",
    tag = "Items",
    params(ItemQuery),
    responses(
        (status = 200, description = "Matching items", body = [ItemView]),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_lost_items_handler(
    State(state): State<AppState>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<ItemView>>>, ApiError> {
    list_items(state, ItemKind::Lost, query).await
}

/// List found items, newest first
#[utoipa::path(
    get,
    path = "/api/items/found",
    tag = "Items",
    params(ItemQuery),
    responses(
        (status = 200, description = "Matching items", body = [ItemView]),
        (status = 400, description = "Invalid filter")
    )
)]
pub async fn list_found_items_handler(
    State(state): State<AppState>,
    query: Result<Query<ItemQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<ItemView>>>, ApiError> {
    list_items(state, ItemKind::Found, query).await
}

#[utoipa::path(
    get,
    path = "/api/items/lost/{item_id}",
    tag = "Items",
    params(("item_id" = String, Path, description = "Lost item id")),
    responses(
        (status = 200, description = "Item", body = ItemView),
        (status = 404, description = "Lost item not found")
    )
)]
pub async fn get_lost_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<Envelope<ItemView>>, ApiError> {
    get_item(state, ItemKind::Lost, &item_id).await
}

#[utoipa::path(
    get,
    path = "/api/items/found/{item_id}",
    tag = "Items",
    params(("item_id" = String, Path, description = "Found item id")),
    responses(
        (status = 200, description = "Item", body = ItemView),
        (status = 404, description = "Found item not found")
    )
)]
pub async fn get_found_item_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> Result<Json<Envelope<ItemView>>, ApiError> {
    get_item(state, ItemKind::Found, &item_id).await
}
