use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP clients as `{"error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No image uploaded")]
    MissingImage,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    #[error("Upload too large")]
    PayloadTooLarge,

    #[error("Inference failed")]
    Inference(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage
            | ApiError::InvalidImage(_)
            | ApiError::UnknownModel(_)
            | ApiError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge
        } else {
            ApiError::MalformedUpload(err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Inference(cause) => {
                tracing::error!(error = ?cause, "Detection failed");
            }
            other => {
                tracing::debug!(error = %other, "Rejected detect request");
            }
        }

        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
