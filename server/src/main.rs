mod api;
mod config;
mod db;
mod models;
mod schema;
mod store;
mod telemetry;
mod types;
mod validation;

use axum::middleware;
use axum::Router;
use config::{Config, ConfigError};
use std::env;
use std::sync::Arc;
use store::{PgStore, RecipeStore};
use thiserror::Error;

/// Application state shared across all handlers
pub type AppState = Arc<dyn RecipeStore>;

#[derive(Error, Debug)]
enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bootstrap(#[from] db::BootstrapError),

    #[error("Bootstrap task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("HTTP server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        match api::openapi().to_pretty_json() {
            Ok(spec) => println!("{}", spec),
            Err(e) => {
                eprintln!("Failed to render OpenAPI spec: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let telemetry = telemetry::init_telemetry();

    let result = run().await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "Server failed to start");
    }

    telemetry.shutdown();
    if result.is_err() {
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = Config::from_env()?;

    // Schema first, then the pool: nothing listens until both are ready.
    let db_config = config.db.clone();
    let pool = tokio::task::spawn_blocking(move || {
        db::ensure_schema(&db_config)?;
        db::create_pool(&db_config)
    })
    .await??;

    tracing::info!(
        database = %config.db.name,
        host = %config.db.host,
        max_connections = config.db.pool_max,
        "Database ready"
    );

    let state: AppState = Arc::new(PgStore::new(pool));
    let app = build_app(state, &config);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);
    tracing::info!(
        "OpenAPI spec available at http://localhost:{}/api-docs/openapi.json",
        config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn build_app(state: AppState, config: &Config) -> Router {
    let mut app = api::router(state);

    if config.track_db_query_count {
        app = app.layer(middleware::from_fn(
            telemetry::db_query_count_header_middleware,
        ));
    }

    app.layer(telemetry::trace_layer())
        // Outermost, so the counter covers the whole request
        .layer(middleware::from_fn(telemetry::query_counting_middleware))
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}
