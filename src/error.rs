use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// StoreError
///
/// Failure reported by a `Repository` implementation. `Busy` is the typed
/// transient-contention signal: the embedded store's single writer slot was taken.
/// Implementations classify their driver errors into it at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("store busy: single writer slot is held")]
    Busy,
    #[error("conflicting write: {0}")]
    Conflict(String),
    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Whether retrying the same write may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Busy)
    }
}

/// WriteError
///
/// Outcome of a write driven through `retry::execute_with_retry`.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Every attempt hit contention. Distinct from any underlying storage fault.
    #[error("write still contended after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// AuthzError
///
/// Errors surfaced by the authorization layer. Only structurally invalid input
/// and role-assignment refusals live here; a missing account on the delete path
/// is never an error, it is a denial.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("identity must not be empty")]
    EmptyIdentity,
    #[error("unsupported content kind `{0}`")]
    UnsupportedKind(String),
    #[error("invalid role `{0}`")]
    InvalidRole(String),
    #[error("content not found")]
    NotFound,
    #[error("super_admin cannot be assigned")]
    SuperAdminAssignment,
    #[error("only super_admin may assign admin")]
    AdminAssignmentRequiresSuperAdmin,
    #[error("acting role does not satisfy admin")]
    InsufficientRole,
    #[error("acting identity does not resolve to an account")]
    UnresolvedActor,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// ApiError
///
/// The HTTP-facing error. Every variant renders as `{ "code": .., "message": .. }`.
/// Authorization refusals collapse into `Forbidden` so the caller never learns
/// whether the account was missing, under-privileged, or simply not the author.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("identity required")]
    Unauthorized,
    #[error("not authorized")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("temporarily unavailable, try again later")]
    Unavailable,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "code": status.as_u16(),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound("record"),
            StoreError::Busy => {
                tracing::warn!("store busy outside of a retried write");
                ApiError::Unavailable
            }
            other => {
                tracing::error!(error = %other, "store failure");
                ApiError::Internal
            }
        }
    }
}

impl From<WriteError> for ApiError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Exhausted { attempts } => {
                tracing::error!(attempts, "write abandoned after contention");
                ApiError::Unavailable
            }
            WriteError::Store(e) => e.into(),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::EmptyIdentity => ApiError::Unauthorized,
            AuthzError::UnsupportedKind(_) => ApiError::BadRequest("invalid content type".into()),
            AuthzError::InvalidRole(_) => ApiError::BadRequest("invalid role".into()),
            AuthzError::NotFound => ApiError::NotFound("content"),
            AuthzError::UnresolvedActor => ApiError::Unauthorized,
            AuthzError::SuperAdminAssignment
            | AuthzError::AdminAssignmentRequiresSuperAdmin
            | AuthzError::InsufficientRole => ApiError::Forbidden,
            AuthzError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_busy_is_transient() {
        assert!(StoreError::Busy.is_transient());
        assert!(!StoreError::NotFound.is_transient());
        assert!(!StoreError::Conflict("dup".into()).is_transient());
    }

    #[test]
    fn exhausted_write_maps_to_unavailable() {
        let api: ApiError = WriteError::Exhausted { attempts: 3 }.into();
        assert_eq!(api.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn role_refusals_are_indistinguishable_to_clients() {
        let a: ApiError = AuthzError::SuperAdminAssignment.into();
        let b: ApiError = AuthzError::InsufficientRole.into();
        assert_eq!(a.status(), StatusCode::FORBIDDEN);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn unsupported_kind_is_a_client_error() {
        let api: ApiError = AuthzError::UnsupportedKind("video".into()).into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.to_string(), "invalid content type");
    }
}
