use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use todo_api_rust::config;
use todo_api_rust::database::DatabaseManager;
use todo_api_rust::middleware::PipelineState;
use todo_api_rust::services::{TodoService, TodoStore};

#[derive(Debug, Parser)]
#[command(name = "todo-api-rust", version, about = "TODO API server")]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// SQLite database file (overrides DB_PATH)
    #[arg(long)]
    db_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DB_PATH, BASIC_AUTH_*, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = config::config().clone();
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(path) = cli.db_path {
        config.database.path = path;
    }
    tracing::info!("Starting TODO API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .with_context(|| format!("failed to open {}", config.database.path.display()))?;
    DatabaseManager::migrate(&pool).await.context("failed to create schema")?;

    let credentials = config.security.credentials();
    if credentials.is_none() {
        tracing::warn!("BASIC_AUTH_USER_ID / BASIC_AUTH_PASSWORD not set; protected routes will reject every request");
    }

    let store: Arc<dyn TodoStore> = Arc::new(TodoService::new(pool.clone()));
    let state = PipelineState::new(credentials).with_panic_response(config.server.panic_response);
    let app = todo_api_rust::app(store, state);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("TODO API listening on http://{}", bind_addr);

    let shutdown = Arc::new(Notify::new());
    let server = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.notified().await })
                .await
        })
    };

    wait_signal().await;
    shutdown.notify_one();

    let grace = config.server.shutdown_grace();
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => {
            joined.context("server task failed")?.context("server closed with error")?;
            tracing::info!("Server shutdown");
        }
        Err(_) => tracing::warn!("Failed to gracefully shutdown within {:?}", grace),
    }

    pool.close().await;
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
async fn wait_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for SIGINT: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down..."),
        _ = terminate => tracing::info!("SIGTERM received, shutting down..."),
    }
}
