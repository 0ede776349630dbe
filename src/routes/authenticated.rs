use crate::{
    AppState,
    handlers::{accounts, content, personal, site},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes that act on behalf of the caller's asserted identity. The router is
/// wrapped in the auth middleware, so a request without the identity header never
/// reaches a handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Own account ---
        .route("/me", get(accounts::get_me))
        .route("/me/nickname", put(accounts::update_nickname))
        .route("/me/avatar", put(accounts::update_avatar))
        // GET /me/published
        // Everything published under the caller's identity, grouped by kind.
        .route("/me/published", get(content::my_published))
        // --- Personal lists ---
        .route(
            "/me/favorites",
            get(personal::list_favorites)
                .post(personal::add_favorite)
                .delete(personal::remove_favorite),
        )
        .route(
            "/me/history",
            get(personal::list_history)
                .post(personal::record_history)
                .delete(personal::clear_history),
        )
        // --- Content writes ---
        // POST /content/{kind}
        // The caller becomes the publisher. Consultations additionally need an admin-level role.
        .route("/content/{kind}", post(content::create_content))
        // PUT, DELETE /content/{kind}/{id}
        // Allowed for the publisher and for admin-level roles.
        .route(
            "/content/{kind}/{id}",
            put(content::update_content).delete(content::delete_content),
        )
        // POST /feedback
        .route("/feedback", post(site::submit_feedback))
}
