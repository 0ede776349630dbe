use crate::{
    AppState,
    handlers::{accounts, content, site},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Read-only content access, the two login flows, the site carousel and the
/// permission-check query. Nothing here mutates content.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/admin
        // Password login for provisioned administrators; returns the `admin_<username>` identity.
        .route("/auth/admin", post(accounts::admin_login))
        // POST /auth/user
        // Get-or-create for externally issued identities.
        .route("/auth/user", post(accounts::user_login))
        // GET /news/latest?count=...
        // Home-page teaser; four items unless told otherwise.
        .route("/news/latest", get(content::latest_news))
        // GET /content/{kind}?keyword=...&category=...&urgency=...
        .route("/content/{kind}", get(content::list_content))
        // GET /content/{kind}/{id}
        // Also bumps the item's view counter.
        .route("/content/{kind}/{id}", get(content::get_content))
        // POST /permissions/check
        // Would this identity be allowed to delete that item?
        .route("/permissions/check", post(content::check_permission))
        // GET /banners
        .route("/banners", get(site::get_banners))
}
