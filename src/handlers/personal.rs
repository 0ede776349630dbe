use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::Caller,
    content::ContentKind,
    error::ApiError,
    models::{Favorite, HistoryEntry, ItemKey, ItemRef},
    retry::execute_with_retry,
};

/// Most recent entries returned by the history listing.
pub const HISTORY_LIMIT: i64 = 100;

fn validate_item(item_kind: &str, item_id: i64) -> Result<(), ApiError> {
    item_kind.parse::<ContentKind>()?;
    if item_id <= 0 {
        return Err(ApiError::BadRequest("item_id is required".into()));
    }
    Ok(())
}

/// add_favorite
///
/// [Authenticated Route] Saves an item, or refreshes it if already saved.
#[utoipa::path(
    post,
    path = "/me/favorites",
    request_body = ItemRef,
    responses((status = 204, description = "Saved"))
)]
pub async fn add_favorite(
    caller: Caller,
    State(state): State<AppState>,
    Json(item): Json<ItemRef>,
) -> Result<StatusCode, ApiError> {
    validate_item(&item.item_kind, item.item_id)?;
    let repo = state.repo.as_ref();
    let identity = caller.as_str();
    let item = &item;
    execute_with_retry(&state.retry, "upsert_favorite", || repo.upsert_favorite(identity, item)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// remove_favorite
#[utoipa::path(
    delete,
    path = "/me/favorites",
    request_body = ItemKey,
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not a favorite")
    )
)]
pub async fn remove_favorite(
    caller: Caller,
    State(state): State<AppState>,
    Json(key): Json<ItemKey>,
) -> Result<StatusCode, ApiError> {
    let repo = state.repo.as_ref();
    let identity = caller.as_str();
    let (kind, id) = (key.item_kind.as_str(), key.item_id);
    let removed = execute_with_retry(&state.retry, "remove_favorite", || {
        repo.remove_favorite(identity, kind, id)
    })
    .await?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("favorite"))
    }
}

/// list_favorites
#[utoipa::path(
    get,
    path = "/me/favorites",
    responses((status = 200, description = "Favorites, newest first", body = [Favorite]))
)]
pub async fn list_favorites(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<Favorite>>, ApiError> {
    Ok(Json(state.repo.list_favorites(caller.as_str()).await?))
}

/// record_history
///
/// [Authenticated Route] Records a view. Viewing an item again moves it to the front.
#[utoipa::path(
    post,
    path = "/me/history",
    request_body = ItemRef,
    responses((status = 204, description = "Recorded"))
)]
pub async fn record_history(
    caller: Caller,
    State(state): State<AppState>,
    Json(item): Json<ItemRef>,
) -> Result<StatusCode, ApiError> {
    validate_item(&item.item_kind, item.item_id)?;
    let repo = state.repo.as_ref();
    let identity = caller.as_str();
    let item = &item;
    execute_with_retry(&state.retry, "upsert_history", || repo.upsert_history(identity, item)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// list_history
#[utoipa::path(
    get,
    path = "/me/history",
    responses((status = 200, description = "Most recent views", body = [HistoryEntry]))
)]
pub async fn list_history(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError> {
    Ok(Json(state.repo.list_history(caller.as_str(), HISTORY_LIMIT).await?))
}

/// clear_history
#[utoipa::path(
    delete,
    path = "/me/history",
    responses((status = 204, description = "Cleared"))
)]
pub async fn clear_history(caller: Caller, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let repo = state.repo.as_ref();
    let identity = caller.as_str();
    let cleared = execute_with_retry(&state.retry, "clear_history", || repo.clear_history(identity)).await?;
    tracing::debug!(identity, cleared, "history cleared");
    Ok(StatusCode::NO_CONTENT)
}
