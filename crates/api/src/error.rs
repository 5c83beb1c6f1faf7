use aivlingual_vocabulary::{CaptionError, PipelineError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Validation(String),
    Cancelled,
    Internal(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            ApiError::Validation(msg) => write!(f, "Validation: {msg}"),
            ApiError::Cancelled => write!(f, "Request cancelled"),
            ApiError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// nginx's "client closed request".
fn client_closed_request() -> StatusCode {
    StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation", msg),
            ApiError::Cancelled => (
                client_closed_request(),
                "cancelled",
                "Extraction was cancelled".to_string(),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", msg),
        };

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Cancelled => ApiError::Cancelled,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CaptionError> for ApiError {
    fn from(err: CaptionError) -> Self {
        match err {
            CaptionError::NoCues => ApiError::Validation("No subtitle cues found".to_string()),
            CaptionError::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}
