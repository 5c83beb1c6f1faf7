pub mod error;
pub mod routes;
pub mod state;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Transcripts of multi-hour streams stay well under this.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let vocabulary_routes = Router::new()
        .route("/extract", post(routes::vocabulary::extract))
        .route("/extract/srt", post(routes::vocabulary::extract_srt))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    let api = Router::new().nest("/vocabulary", vocabulary_routes);

    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "nlp_enabled": state.pipeline.provider().is_available(),
        "translator": state.pipeline.translator_name(),
    }))
}
