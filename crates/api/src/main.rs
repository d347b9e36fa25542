use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classiklust_api::config::ServerConfig;
use classiklust_api::router::build_app_router;
use classiklust_api::state::AppState;
use classiklust_db::repositories::SessionRepo;
use classiklust_gamedata::snapshot::PlayerSnapshotWriter;
use classiklust_gamedata::{DataLayout, GameData, PgCatalogStore};
use classiklust_lunabug::{LunaBug, LunaBugConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "classiklust_api=debug,classiklust_gamedata=debug,classiklust_lunabug=debug,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        env = ?config.app_env,
        game_data_dir = %config.game_data_dir.display(),
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = classiklust_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    classiklust_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    classiklust_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    match SessionRepo::cleanup_expired(&pool).await {
        Ok(removed) => tracing::info!(removed, "Expired sessions removed"),
        Err(e) => tracing::warn!(error = %e, "Expired session cleanup failed"),
    }

    // --- Game data ---
    let layout = DataLayout::new(config.game_data_dir.clone());
    let game_data = Arc::new(GameData::new(layout.clone(), PgCatalogStore::new(pool.clone())));
    let report = game_data.sync_all().await;
    for entity in &report.entities {
        tracing::info!(
            kind = %entity.kind,
            source = ?entity.source,
            loaded = entity.loaded,
            cached = entity.cached,
            warnings = entity.warnings.len(),
            "Game data synced"
        );
    }
    if report.has_errors() {
        tracing::error!("Game data sync finished with errors; serving what was cached");
    }

    // --- LunaBug ---
    let lunabug_config = LunaBugConfig::from_env()
        .within_request_timeout(Duration::from_secs(config.request_timeout_secs));
    let lunabug = LunaBug::from_config(&lunabug_config)
        .expect("Failed to build LunaBug HTTP client");
    tracing::info!(providers = lunabug.status().len(), "LunaBug ready");

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .expect("Failed to create uploads directory");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        game_data,
        snapshots: Arc::new(PlayerSnapshotWriter::new(&layout)),
        lunabug: Arc::new(lunabug),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
