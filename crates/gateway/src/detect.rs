use crate::{error::ApiError, state::AppState};
use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::StatusCode,
};
use image::RgbImage;
use inference::Detection;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
    pub highest_confidence_detection: Option<Detection>,
    pub model_used: String,
}

#[derive(Default)]
struct Upload {
    image: Option<Bytes>,
    model: Option<String>,
}

/// `POST /detect`: run one uploaded image through the requested model.
///
/// Requests that are not multipart at all are answered like a request
/// without an `image` field. Every request is counted, rejected ones
/// included.
#[tracing::instrument(
    name = "detect_request",
    skip_all,
    fields(model = tracing::field::Empty, detections = tracing::field::Empty)
)]
pub async fn detect(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let started = Instant::now();
    let mut model_used = None;

    let result = run_detect(&state, multipart, &mut model_used).await;

    let (status, returned) = match &result {
        Ok(response) => (StatusCode::OK, response.detections.len()),
        Err(err) => (err.status(), 0),
    };
    state.metrics.record(
        model_used.as_deref(),
        status,
        returned,
        started.elapsed().as_secs_f64(),
    );

    result.map(Json)
}

/// `model_used` is filled in as soon as a model has been picked, so failures
/// after that point are still attributed to it.
async fn run_detect(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
    model_used: &mut Option<String>,
) -> Result<DetectResponse, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Request body is not multipart");
        ApiError::MissingImage
    })?;

    let upload = read_upload(multipart).await?;
    let image_bytes = upload
        .image
        .filter(|bytes| !bytes.is_empty())
        .ok_or(ApiError::MissingImage)?;

    let requested = upload.model.as_deref();
    let resolved = state.registry.resolve(requested);
    if resolved.fell_back {
        let requested = requested.unwrap_or_default().to_string();
        if state.strict_model_selection {
            return Err(ApiError::UnknownModel(requested));
        }
        tracing::warn!(
            requested = ?requested,
            fallback = %resolved.name,
            "Unknown model requested, using default"
        );
    }

    let span = tracing::Span::current();
    span.record("model", resolved.name.as_str());
    *model_used = Some(resolved.name.clone());

    let detector = Arc::clone(&resolved.detector);
    let raw = tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            let image = decode_image(&image_bytes)?;
            detector.detect(&image).map_err(ApiError::Inference)
        })
    })
    .await
    .map_err(|e| ApiError::Inference(e.into()))??;

    let selection = state.selection.select(raw);
    tracing::Span::current().record("detections", selection.detections.len() as u64);

    Ok(DetectResponse {
        detections: selection.detections,
        highest_confidence_detection: selection.highest_confidence,
        model_used: resolved.name,
    })
}

/// First `image` and first `model` field win; other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") if upload.image.is_none() => {
                upload.image = Some(field.bytes().await?);
            }
            Some("model") if upload.model.is_none() => {
                upload.model = Some(field.text().await?);
            }
            _ => {}
        }
    }

    Ok(upload)
}

fn decode_image(bytes: &[u8]) -> Result<RgbImage, ApiError> {
    let image =
        image::load_from_memory(bytes).map_err(|e| ApiError::InvalidImage(e.to_string()))?;
    Ok(image.to_rgb8())
}
