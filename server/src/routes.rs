use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use docchat_core::documents::DocumentRecord;
use docchat_core::error::AppError;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub message: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/upload/", post(upload_handler))
        .route("/chat/", post(chat_handler))
        .route("/documents/", get(documents_handler))
        // PDFs routinely exceed axum's 2 MB default body limit.
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let checked = tokio::task::spawn_blocking(move || state.ollama_health()).await;
    match checked {
        Ok(Ok(())) => Json(HealthResponse {
            ok: true,
            message: "ok".to_string(),
        }),
        Ok(Err(e)) => Json(HealthResponse {
            ok: false,
            message: e.to_string(),
        }),
        Err(e) => Json(HealthResponse {
            ok: false,
            message: format!("health check task failed: {e}"),
        }),
    }
}

async fn upload_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError(
            AppError::new("UPLOAD_INVALID", "Failed to read multipart field")
                .with_details(e.to_string()),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| {
            ApiError(
                AppError::new("UPLOAD_INVALID", "Failed to read uploaded file bytes")
                    .with_details(e.to_string()),
            )
        })?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) = upload.ok_or_else(|| {
        ApiError(AppError::new(
            "UPLOAD_INVALID",
            "Multipart field 'file' is required",
        ))
    })?;

    tracing::info!(filename = %filename, bytes = bytes.len(), "processing upload");

    let processed = tokio::task::spawn_blocking(move || state.process_upload(&filename, &bytes))
        .await
        .map_err(|e| {
            ApiError(
                AppError::new("UPLOAD_TASK_FAILED", "Upload task failed")
                    .with_details(e.to_string()),
            )
        })??;

    Ok(Json(UploadResponse {
        message: format!("Processed {processed} successfully"),
    }))
}

async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ChatForm>,
) -> Result<Json<ChatResponse>, ApiError> {
    let answer = tokio::task::spawn_blocking(move || state.answer_query(&form.query))
        .await
        .map_err(|e| {
            ApiError(
                AppError::new("CHAT_TASK_FAILED", "Chat task failed").with_details(e.to_string()),
            )
        })??;

    Ok(Json(ChatResponse { answer }))
}

async fn documents_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DocumentRecord>>, ApiError> {
    let docs = tokio::task::spawn_blocking(move || state.list_documents())
        .await
        .map_err(|e| {
            ApiError(
                AppError::new("DB_TASK_FAILED", "Documents task failed")
                    .with_details(e.to_string()),
            )
        })??;
    Ok(Json(docs))
}
