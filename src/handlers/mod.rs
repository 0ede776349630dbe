//! HTTP handlers.
//!
//! Handlers parse and validate input, delegate every authorization decision to
//! `permission`, and drive every write through the contended-write executor.

pub mod accounts;
pub mod content;
pub mod personal;
pub mod site;

use crate::{AppState, auth::Caller, error::ApiError, permission};

/// Coarse admin gate shared by the `/admin` handlers.
pub(crate) async fn require_admin(state: &AppState, caller: &Caller) -> Result<(), ApiError> {
    if permission::is_admin(state.repo.as_ref(), caller.as_str()).await {
        Ok(())
    } else {
        tracing::debug!(identity = caller.as_str(), "admin gate denied");
        Err(ApiError::Forbidden)
    }
}

/// Trimmed, non-empty text field or a 400 naming the field.
pub(crate) fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed)
}
