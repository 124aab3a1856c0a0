use thiserror::Error;

use crate::engine::EngineError;
use stenogramma_protocol::EnvelopeError;

/// Application-wide error types
///
/// Each variant marks the pipeline stage that failed. Validation failures
/// happen before anything sensitive exists; everything after decryption
/// reports the same client-facing prefix.
#[derive(Error, Debug)]
pub enum AppError {
    /// Upload rejected before any decryption or staging
    #[error("{0}")]
    Validation(String),

    #[error("Unreadable upload: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Processing error: {0}")]
    Crypto(#[from] EnvelopeError),

    #[error("Processing error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Processing error: {0}")]
    Transcription(#[from] EngineError),
}

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transcription(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": status.as_u16()
        });
        (status, axum::Json(body)).into_response()
    }
}
