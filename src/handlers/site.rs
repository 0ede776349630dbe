use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::warn;

use super::{require_admin, required};
use crate::{
    AppState,
    auth::Caller,
    error::ApiError,
    identity,
    models::{Banner, CreateFeedbackRequest, Created, Feedback},
    retry::execute_with_retry,
};

/// Settings key holding the banner list as JSON.
pub const BANNERS_KEY: &str = "banners";

/// Slides shown until an administrator configures their own.
pub fn default_banners() -> Vec<Banner> {
    [
        ("https://images.unsplash.com/photo-1500382017468-9049fed747ef?w=800", "美丽乡村"),
        ("https://images.unsplash.com/photo-1464226184884-fa280b87c399?w=800", "田园风光"),
        ("https://images.unsplash.com/photo-1475924156734-496f6cac6ec1?w=800", "绿色生态"),
    ]
    .into_iter()
    .map(|(url, title)| Banner {
        url: url.to_string(),
        title: title.to_string(),
    })
    .collect()
}

/// submit_feedback
///
/// [Authenticated Route] Files feedback. The caller's nickname is attached when the
/// identity resolves to an account.
#[utoipa::path(
    post,
    path = "/feedback",
    request_body = CreateFeedbackRequest,
    responses(
        (status = 201, description = "Submitted", body = Created),
        (status = 400, description = "Missing type or content")
    )
)]
pub async fn submit_feedback(
    caller: Caller,
    State(state): State<AppState>,
    Json(req): Json<CreateFeedbackRequest>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    required(&req.feedback_type, "type")?;
    required(&req.content, "content")?;

    let repo = state.repo.as_ref();
    let nickname = match identity::resolve_raw(repo, caller.as_str()).await {
        Ok(Some(account)) => account.nickname().to_string(),
        Ok(None) => String::new(),
        Err(e) => {
            warn!(identity = caller.as_str(), error = %e, "feedback author not resolved");
            String::new()
        }
    };

    let identity = caller.as_str();
    let (nickname, req) = (nickname.as_str(), &req);
    let id = execute_with_retry(&state.retry, "create_feedback", || {
        repo.create_feedback(identity, nickname, req)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// list_feedback
///
/// [Admin Route] All feedback, newest first.
#[utoipa::path(
    get,
    path = "/admin/feedback",
    responses(
        (status = 200, description = "Feedback", body = [Feedback]),
        (status = 403, description = "Not authorized")
    )
)]
pub async fn list_feedback(
    caller: Caller,
    State(state): State<AppState>,
) -> Result<Json<Vec<Feedback>>, ApiError> {
    require_admin(&state, &caller).await?;
    Ok(Json(state.repo.list_feedback().await?))
}

/// mark_feedback_read
#[utoipa::path(
    put,
    path = "/admin/feedback/{id}/read",
    responses(
        (status = 204, description = "Marked"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn mark_feedback_read(
    caller: Caller,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    require_admin(&state, &caller).await?;
    let repo = state.repo.as_ref();
    let marked = execute_with_retry(&state.retry, "mark_feedback_read", || repo.mark_feedback_read(id)).await?;
    if marked {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("feedback"))
    }
}

/// get_banners
///
/// [Public Route] The configured carousel, or the built-in one when unset or unreadable.
#[utoipa::path(
    get,
    path = "/banners",
    responses((status = 200, description = "Banners", body = [Banner]))
)]
pub async fn get_banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>, ApiError> {
    let banners = match state.repo.get_setting(BANNERS_KEY).await? {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "stored banners are not valid JSON, serving defaults");
            default_banners()
        }),
        None => default_banners(),
    };
    Ok(Json(banners))
}

/// put_banners
///
/// [Admin Route] Replaces the carousel.
#[utoipa::path(
    put,
    path = "/admin/banners",
    request_body = [Banner],
    responses(
        (status = 200, description = "Saved", body = [Banner]),
        (status = 403, description = "Not authorized")
    )
)]
pub async fn put_banners(
    caller: Caller,
    State(state): State<AppState>,
    Json(banners): Json<Vec<Banner>>,
) -> Result<Json<Vec<Banner>>, ApiError> {
    require_admin(&state, &caller).await?;
    if banners.iter().any(|b| b.url.trim().is_empty()) {
        return Err(ApiError::BadRequest("banner url is required".into()));
    }

    let encoded = serde_json::to_string(&banners).map_err(|e| {
        tracing::error!(error = %e, "banner encoding failed");
        ApiError::Internal
    })?;
    let repo = state.repo.as_ref();
    let encoded = encoded.as_str();
    execute_with_retry(&state.retry, "put_banners", || repo.put_setting(BANNERS_KEY, encoded)).await?;

    tracing::info!(identity = caller.as_str(), count = banners.len(), "banners updated");
    Ok(Json(banners))
}
