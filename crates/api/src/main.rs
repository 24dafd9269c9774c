use std::sync::Arc;

use lifesafe_api::config::ServerConfig;
use lifesafe_api::router::build_app_router;
use lifesafe_api::state::AppState;
use lifesafe_events::{Composer, Mailer};
use lifesafe_lifecycle::{LifecycleConfig, LifecycleManager, PgClassStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifesafe_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(
        bind_addr = %config.bind_addr,
        origins = config.cors_origins.len(),
        "Loaded server configuration",
    );

    // --- Database ---
    let pool = lifesafe_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    lifesafe_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    lifesafe_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Lifecycle ---
    let mailer = Mailer::from_env();
    if !mailer.is_enabled() {
        tracing::warn!("SMTP is not configured; notices will be skipped");
    }
    let lifecycle_config = LifecycleConfig::from_env();
    let repair = lifecycle_config.reconcile_repair;
    let lifecycle = Arc::new(LifecycleManager::new(
        PgClassStore::new(pool),
        mailer,
        Composer::from_env(),
        lifecycle_config,
    ));

    // Finish any promotion a previous run left half done.
    match lifecycle.reconcile(repair).await {
        Ok(report) => tracing::info!(
            leftovers = report.leftover_request_ids.len(),
            repaired = report.repaired_request_ids.len(),
            "Startup reconciliation complete",
        ),
        Err(e) => tracing::error!(error = %e, "Startup reconciliation failed"),
    }

    // --- App state ---
    let addr = config.bind_addr;
    let state = AppState {
        lifecycle,
        config: Arc::new(config),
    };
    let app = build_app_router(state);

    // --- Start server ---
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

/// Wait for SIGINT or SIGTERM.
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
