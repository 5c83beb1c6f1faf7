use aivlingual_vocabulary::{ExtractionOutput, ExtractionRequest, parse_srt};
use axum::{Json, extract::State};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{error::ApiError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ExtractSrtRequest {
    pub srt: String,
    pub source_id: Option<String>,
}

pub async fn extract(
    State(state): State<AppState>,
    Json(body): Json<ExtractionRequest>,
) -> Result<Json<ExtractionOutput>, ApiError> {
    if !body.transcript.is_empty() && !body.segments.is_empty() {
        return Err(ApiError::BadRequest(
            "Send either transcript or segments, not both".to_string(),
        ));
    }
    run(&state, body).await
}

pub async fn extract_srt(
    State(state): State<AppState>,
    Json(body): Json<ExtractSrtRequest>,
) -> Result<Json<ExtractionOutput>, ApiError> {
    let cues = parse_srt(&body.srt)?;
    let mut request = ExtractionRequest::from_segments(cues);
    request.source_id = body.source_id;
    run(&state, request).await
}

/// The guard cancels the pipeline if the client goes away and axum drops
/// this future.
async fn run(state: &AppState, request: ExtractionRequest) -> Result<Json<ExtractionOutput>, ApiError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let output = state.pipeline.extract(request, cancel).await?;
    Ok(Json(output))
}
