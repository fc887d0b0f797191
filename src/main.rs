// src/main.rs

use std::sync::Arc;
use std::time::Duration;

use bookmarks::config::Config;
use bookmarks::counter::RedisCounter;
use bookmarks::error::AppError;
use bookmarks::state::AppState;
use bookmarks::{db, routes, templates};
use dotenvy::dotenv;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Err(e) = run(config).await {
        tracing::error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: Config) -> Result<(), AppError> {
    let pool = db::connect(&config.database_url).await?;

    let counters = RedisCounter::open(&config.redis_url())?;
    match counters.health_check().await {
        Ok(true) => tracing::info!("Counter store reachable"),
        Ok(false) => tracing::warn!("Counter store did not answer PING"),
        Err(e) => tracing::warn!("Counter store unavailable at startup: {}", e),
    }

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
        counters: Arc::new(counters),
        templates: Arc::new(templates::load()?),
        http,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
