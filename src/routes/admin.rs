use crate::{
    AppState,
    handlers::{accounts, site},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Nested under `/admin`. The router only guarantees an identity header is present;
/// each handler resolves the caller and applies the admin-level gate, and role
/// changes go through the stricter role-assignment gate.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/users?page=&page_size=&role=
        .route("/users", get(accounts::list_users))
        // POST /admin/users/role
        // Role change by account id. Only super_admin may grant admin; nobody may grant super_admin.
        .route("/users/role", post(accounts::update_user_role))
        // POST /admin/grant-role
        // Same gate, addressed by external identity.
        .route("/grant-role", post(accounts::grant_role))
        // --- Feedback moderation ---
        .route("/feedback", get(site::list_feedback))
        .route("/feedback/{id}/read", put(site::mark_feedback_read))
        // PUT /admin/banners
        .route("/banners", put(site::put_banners))
}
