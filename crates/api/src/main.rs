use aivlingual_api::{build_router, state::AppState};
use aivlingual_config::Settings;
use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::load().context("loading settings")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    if settings.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let state = AppState::from_settings(&settings)?;

    // Load the lexicons once up front instead of on the first request.
    let provider = state.pipeline.provider().clone();
    let nlp_enabled = tokio::task::spawn_blocking(move || provider.is_available()).await?;
    if !nlp_enabled {
        warn!("NLP models unavailable, serving pattern-only extraction");
    }

    let app = build_router(state);
    let addr = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, nlp_enabled, "AIVlingual API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutting down");
}
