// API server binary entry point
//
// Usage: cargo run --features api --bin api_server

use companion_guide::{create_router, AppConfig, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "companion_guide=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let config = AppConfig::from_env();

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {:?}", config.data_dir);
    tracing::info!("  PLANTS_FILE: {:?}", config.plants_file);
    tracing::info!("  DIARY_FILE: {:?}", config.diary_file);
    tracing::info!("  HISTORY_FILE: {:?}", config.history_file);
    tracing::info!("  GEMINI_MODEL: {}", config.gemini_model);
    tracing::info!("  AI_TIMEOUT: {:?}", config.ai_timeout);
    tracing::info!("  MIN_LOCAL_CANDIDATES: {}", config.min_local_candidates);
    tracing::info!("  PORT: {}", config.port);

    // Initialize application state (loads plants, history, analysis client)
    tracing::info!("Initializing application state...");
    let state = AppState::new(&config).await?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
