mod card;
mod config;
mod metrics;
mod routes;

use anyhow::{Context, Result};
use extract::{ExtractionSession, Extractor};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, api_key_from};
use crate::metrics::{MeteredExtractor, Metrics};
use crate::routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let api_key = api_key_from(|key| std::env::var(key).ok())?;

    // One extractor for the life of the process, credential injected here
    let metrics = Metrics::new();
    let gemini = extract::gemini_extractor(config.gemini_config(api_key))
        .context("Failed to create Gemini extractor")?;
    let model = gemini.backend().model().to_string();
    let extractor: Arc<dyn Extractor> = Arc::new(MeteredExtractor::new(gemini, metrics.clone()));

    let state = Arc::new(AppState {
        session: ExtractionSession::new(extractor),
        metrics,
        model,
    });

    let app = routes::router(state, config.server.max_image_bytes);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(
        addr = %addr,
        model = %config.gemini.model,
        timeout_secs = ?config.gemini.request_timeout_secs,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` controls the filter (default `info`); `LOG_FORMAT=json` switches
/// to structured output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
