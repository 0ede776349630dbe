use regional_portal::{
    AppState,
    auth::hash_password,
    config::{AppConfig, Env},
    create_router,
    repository::{Repository, RepositoryState, SqliteRepository},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Startup: configuration, logging, the embedded store and its migrations, the
/// default administrator, then the HTTP server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration (fail-fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter: RUST_LOG wins, otherwise crate debug plus request logs.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "regional_portal=debug,tower_http=info".into());

    // 3. Log format by environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Embedded store: single writer connection, schema migrations.
    let store = SqliteRepository::connect(&config.db_url, config.db_busy_timeout).await?;
    store.migrate().await?;
    tracing::info!(db = %config.db_url, "database ready");

    // 5. Startup invariant: exactly one administrator, `admin`, as super_admin.
    let password_hash = hash_password(&config.admin_default_password)
        .map_err(|e| format!("hashing the default admin password failed: {e}"))?;
    store.provision_default_admin(&password_hash).await?;

    let repo = Arc::new(store) as RepositoryState;

    // 6. State, router, server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState::new(repo, config));

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at: http://{}/swagger-ui", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
