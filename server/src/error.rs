use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use docchat_core::error::AppError;
use serde::Serialize;

/// Wraps the backend error type so handlers can use `?` and still produce
/// the `{"error": ..., "code": ...}` payload the frontend expects.
#[derive(Debug)]
pub struct ApiError(pub AppError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

fn status_for(err: &AppError) -> StatusCode {
    match err.code.as_str() {
        "UPLOAD_INVALID" | "PDF_EXTRACT_FAILED" | "PDF_EXTRACT_EMPTY" | "CORPUS_EMPTY"
        | "QUERY_INVALID" => StatusCode::BAD_REQUEST,
        "INDEX_NOT_READY" => StatusCode::CONFLICT,
        "UPLOAD_NOT_FOUND" | "CORPUS_CHUNK_NOT_FOUND" => StatusCode::NOT_FOUND,
        "AI_OLLAMA_UNREACHABLE" | "AI_OLLAMA_UNHEALTHY" => StatusCode::SERVICE_UNAVAILABLE,
        _ if err.retryable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(code = %self.0.code, message = %self.0.message, "request failed");
        } else {
            tracing::debug!(code = %self.0.code, message = %self.0.message, "request rejected");
        }
        let body = ErrorBody {
            error: self.0.message,
            code: self.0.code,
            details: self.0.details,
        };
        (status, Json(body)).into_response()
    }
}
