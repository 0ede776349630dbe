use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Authorization core.
pub mod identity;
pub mod ownership;
pub mod permission;
pub mod retry;
pub mod roles;

// Data, storage and configuration.
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod repository;

// HTTP surface.
pub mod auth;
pub mod handlers;
pub mod routes;
use auth::Caller;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{MemoryRepository, RepositoryState, SqliteRepository};
pub use retry::RetryPolicy;

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and the
/// `ToSchema` payloads. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::accounts::admin_login, handlers::accounts::user_login, handlers::accounts::get_me,
        handlers::accounts::update_nickname, handlers::accounts::update_avatar,
        handlers::accounts::list_users, handlers::accounts::update_user_role, handlers::accounts::grant_role,
        handlers::content::list_content, handlers::content::latest_news, handlers::content::get_content,
        handlers::content::create_content, handlers::content::update_content,
        handlers::content::delete_content, handlers::content::check_permission, handlers::content::my_published,
        handlers::personal::add_favorite, handlers::personal::remove_favorite, handlers::personal::list_favorites,
        handlers::personal::record_history, handlers::personal::list_history, handlers::personal::clear_history,
        handlers::site::submit_feedback, handlers::site::list_feedback, handlers::site::mark_feedback_read,
        handlers::site::get_banners, handlers::site::put_banners,
    ),
    components(
        schemas(
            roles::Role, content::ContentKind, content::ContentItem,
            content::News, content::Farmhouse, content::Policy, content::Tourism, content::Job,
            content::HelpRequest, content::Consultation,
            content::NewsDraft, content::FarmhouseDraft, content::PolicyDraft, content::TourismDraft,
            content::JobDraft, content::HelpDraft, content::ConsultationDraft,
            models::AdminAccount, models::UserAccount, models::Profile, models::UserPage,
            models::AdminLoginRequest, models::AdminLoginResponse, models::UserLoginRequest,
            models::UpdateNicknameRequest, models::UpdateAvatarRequest,
            models::UpdateRoleRequest, models::GrantRoleRequest, models::RoleChanged,
            models::PermissionCheckRequest, models::PermissionCheckResponse,
            models::Created, models::PublishedGroup,
            models::Favorite, models::HistoryEntry, models::ItemRef, models::ItemKey,
            models::Feedback, models::CreateFeedbackRequest, models::Banner,
        )
    ),
    tags(
        (name = "regional-portal", description = "Regional information portal API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The single shared container handed to every handler: the store, the loaded
/// configuration, and the write policy derived from it.
#[derive(Clone)]
pub struct AppState {
    /// Store access behind the `Repository` contract.
    pub repo: RepositoryState,
    /// The loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Bounds for retrying writes against the single-writer store.
    pub retry: RetryPolicy,
}

impl AppState {
    pub fn new(repo: RepositoryState, config: AppConfig) -> Self {
        let retry = config.retry_policy();
        Self { repo, config, retry }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects requests that carry no identity header before routing reaches the
/// handler. Extracting `Caller` is the whole check; its rejection is a 401.
async fn auth_middleware(_caller: Caller, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing table, applies the scoped auth layer and the global
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Swagger UI over the generated OpenAPI document.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: no identity required.
        .merge(public::public_routes())
        // Authenticated Routes: identity header required.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        // Admin Routes: identity header required; role gates run inside the handlers.
        .nest(
            "/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID generation.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. One tracing span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo the request id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span with method, URI and the `x-request-id` header so
/// every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
