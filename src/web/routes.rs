use crate::error::AppError;
use crate::service::TranscriptionService;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use stenogramma_protocol::{EndpointInfo, EndpointRegistry};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TranscriptionService>,
    pub registry: Arc<EndpointRegistry>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Secret endpoint discovery. Deliberately unauthenticated: whoever can
/// reach the service may ask where to upload.
pub async fn endpoint_info(State(state): State<AppState>) -> Json<EndpointInfo> {
    Json(state.registry.describe())
}

/// Encrypted upload handler mounted at `/{token}`.
///
/// A wrong token answers exactly like an unknown path.
pub async fn transcribe(
    State(state): State<AppState>,
    Path(token): Path<String>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    if !state.registry.matches(&token) {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await?;
            upload = Some((filename, data.to_vec()));
            break;
        }
    }

    let (filename, payload) = match upload {
        Some(upload) => upload,
        None => return Err(AppError::validation("No file uploaded")),
    };
    debug!(filename = %filename, bytes = payload.len(), "Upload received");

    let sealed = state.service.process(&filename, &payload).await?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (
                header::CONTENT_DISPOSITION,
                "attachment;filename=encrypted_result.bin",
            ),
        ],
        sealed,
    )
        .into_response())
}

/// Create the web router
pub fn create_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/endpoint_info", get(endpoint_info))
        .route("/{token}", post(transcribe))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
