use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::required;
use crate::{
    AppState,
    auth::Caller,
    content::{ContentDraft, ContentItem, ContentKind},
    error::ApiError,
    models::{Created, PermissionCheckRequest, PermissionCheckResponse, PublishedGroup},
    ownership, permission,
    repository::ContentFilter,
    retry::execute_with_retry,
};

/// ContentQuery
///
/// Query parameters for content listings.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ContentQuery {
    /// Case-insensitive match against the kind's title-like fields.
    pub keyword: Option<String>,
    /// Exact category; `全部` or empty lists everything.
    pub category: Option<String>,
    /// Exact urgency. Only help requests carry one.
    pub urgency: Option<String>,
}

/// LatestQuery
///
/// How many of the newest news items to return.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct LatestQuery {
    pub count: Option<i64>,
}

const DEFAULT_LATEST_COUNT: i64 = 4;

/// list_content
///
/// [Public Route] Lists one content kind, newest first.
#[utoipa::path(
    get,
    path = "/content/{kind}",
    params(("kind" = String, Path, description = "Content kind tag"), ContentQuery),
    responses(
        (status = 200, description = "Items", body = [ContentItem]),
        (status = 400, description = "Invalid content type")
    )
)]
pub async fn list_content(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Vec<ContentItem>>, ApiError> {
    let kind: ContentKind = kind.parse()?;
    let filter = ContentFilter {
        keyword: query.keyword,
        category: query.category,
        urgency: query.urgency,
        limit: None,
    };
    Ok(Json(state.repo.list_content(kind, &filter).await?))
}

/// latest_news
///
/// [Public Route] The newest news items for the home page, at most `count` (default 4).
#[utoipa::path(
    get,
    path = "/news/latest",
    params(LatestQuery),
    responses((status = 200, description = "Newest news items", body = [ContentItem]))
)]
pub async fn latest_news(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<Vec<ContentItem>>, ApiError> {
    let filter = ContentFilter {
        limit: Some(query.count.unwrap_or(DEFAULT_LATEST_COUNT).max(0)),
        ..Default::default()
    };
    Ok(Json(state.repo.list_content(ContentKind::News, &filter).await?))
}

/// get_content
///
/// [Public Route] One item. Counts a view; a failed counter update does not fail the read.
#[utoipa::path(
    get,
    path = "/content/{kind}/{id}",
    responses(
        (status = 200, description = "Item", body = ContentItem),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_content(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<Json<ContentItem>, ApiError> {
    let kind: ContentKind = kind.parse()?;
    let mut item = state
        .repo
        .get_content(kind, id)
        .await?
        .ok_or(ApiError::NotFound("content"))?;

    match state.repo.increment_views(kind, id).await {
        Ok(()) => item.bump_views(),
        Err(e) => warn!(%kind, id, error = %e, "view counter not updated"),
    }
    Ok(Json(item))
}

/// create_content
///
/// [Authenticated Route] Publishes a new item. The caller's identity is recorded as
/// the publisher and can never be changed. Consultations are admin-only.
#[utoipa::path(
    post,
    path = "/content/{kind}",
    responses(
        (status = 201, description = "Created", body = Created),
        (status = 403, description = "Not authorized"),
        (status = 503, description = "Store busy")
    )
)]
pub async fn create_content(
    caller: Caller,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    let kind: ContentKind = kind.parse()?;
    let draft = ContentDraft::from_json(kind, body)
        .map_err(|e| ApiError::BadRequest(format!("invalid payload: {e}")))?;
    required(draft.title(), "title")?;

    if kind == ContentKind::Consultation
        && !permission::can_create_consultation(state.repo.as_ref(), caller.as_str()).await
    {
        return Err(ApiError::Forbidden);
    }

    let repo = state.repo.as_ref();
    let publisher = caller.as_str();
    let draft = &draft;
    let id = execute_with_retry(&state.retry, "create_content", || {
        repo.create_content(publisher, draft)
    })
    .await?;

    info!(%kind, id, publisher, "content created");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// update_content
///
/// [Authenticated Route] Replaces the editable fields of an item. Allowed to the
/// same callers as a delete; the recorded publisher is never touched.
#[utoipa::path(
    put,
    path = "/content/{kind}/{id}",
    responses(
        (status = 200, description = "Updated item", body = ContentItem),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Not Found"),
        (status = 503, description = "Store busy")
    )
)]
pub async fn update_content(
    caller: Caller,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<ContentItem>, ApiError> {
    let kind: ContentKind = kind.parse()?;
    let draft = ContentDraft::from_json(kind, body)
        .map_err(|e| ApiError::BadRequest(format!("invalid payload: {e}")))?;
    required(draft.title(), "title")?;

    let repo = state.repo.as_ref();
    let publisher = ownership::owner_of_kind(repo, kind, id).await?;
    if !permission::can_delete(repo, caller.as_str(), &publisher).await {
        return Err(ApiError::Forbidden);
    }

    let draft = &draft;
    let updated = execute_with_retry(&state.retry, "update_content", || repo.update_content(id, draft)).await?;
    if !updated {
        return Err(ApiError::NotFound("content"));
    }

    info!(%kind, id, identity = caller.as_str(), publisher = %publisher, "content updated");
    let item = repo.get_content(kind, id).await?.ok_or(ApiError::NotFound("content"))?;
    Ok(Json(item))
}

/// delete_content
///
/// [Authenticated Route] Removes an item if the caller published it or holds an
/// admin-level role. Refusals carry no reason.
#[utoipa::path(
    delete,
    path = "/content/{kind}/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_content(
    caller: Caller,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, i64)>,
) -> Result<StatusCode, ApiError> {
    let kind: ContentKind = kind.parse()?;
    let repo = state.repo.as_ref();
    let publisher = ownership::owner_of_kind(repo, kind, id).await?;

    if !permission::can_delete(repo, caller.as_str(), &publisher).await {
        return Err(ApiError::Forbidden);
    }

    let deleted = execute_with_retry(&state.retry, "delete_content", || repo.delete_content(kind, id)).await?;
    if !deleted {
        return Err(ApiError::NotFound("content"));
    }

    info!(%kind, id, identity = caller.as_str(), publisher = %publisher, "content deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// check_permission
///
/// [Public Route] Answers whether `identity` may delete the referenced item and
/// echoes the recorded publisher for auditing.
#[utoipa::path(
    post,
    path = "/permissions/check",
    request_body = PermissionCheckRequest,
    responses(
        (status = 200, description = "Decision", body = PermissionCheckResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Content not found")
    )
)]
pub async fn check_permission(
    State(state): State<AppState>,
    Json(req): Json<PermissionCheckRequest>,
) -> Result<Json<PermissionCheckResponse>, ApiError> {
    let identity = required(&req.identity, "identity")?;
    let kind = required(&req.content_kind, "content_kind")?;
    if req.content_id <= 0 {
        return Err(ApiError::BadRequest("content_id is required".into()));
    }

    let repo = state.repo.as_ref();
    let publisher_identity = ownership::owner_of(repo, kind, req.content_id).await?;
    let can_delete = permission::can_delete(repo, identity, &publisher_identity).await;

    Ok(Json(PermissionCheckResponse {
        can_delete,
        publisher_identity,
        identity: identity.to_string(),
    }))
}

/// my_published
///
/// [Authenticated Route] Everything the caller has published, grouped by kind.
/// Kinds with no items are left out.
#[utoipa::path(
    get,
    path = "/me/published",
    responses((status = 200, description = "Published items", body = [PublishedGroup]))
)]
pub async fn my_published(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublishedGroup>>, ApiError> {
    let mut groups = Vec::new();
    for kind in ContentKind::ALL {
        let items = state.repo.list_content_by_publisher(kind, caller.as_str()).await?;
        if !items.is_empty() {
            groups.push(PublishedGroup {
                kind: kind.as_str().to_string(),
                items,
            });
        }
    }
    Ok(Json(groups))
}
