//! Document classification routes
//!
//! Endpoints:
//! - POST /predict - Classify every page of an uploaded PDF
//! - GET /model-info - Details of the loaded classifier

use std::io::Write;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::classifier::pipeline::{classify_document, PagePrediction};
use crate::error::{AppError, Result};
use crate::state::AppState;

const MODEL_NOT_LOADED: &str = "Document classification model is not loaded";

/// Create the classification router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/predict",
            post(predict).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/model-info", get(model_info))
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub filename: String,
    pub page_count: usize,
    pub predictions: Vec<PagePrediction>,
}

/// An uploaded PDF pulled out of the multipart body
struct PdfUpload {
    filename: String,
    data: axum::body::Bytes,
}

/// Map a multipart read failure, keeping body-limit overruns apart
fn upload_error(err: MultipartError, context: &str, max_upload_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "Upload exceeds the maximum size of {} bytes",
            max_upload_bytes
        ))
    } else {
        AppError::BadRequest(format!("{}: {}", context, err))
    }
}

/// Find the `file` field and check it names a PDF
async fn read_pdf_upload(multipart: &mut Multipart, max_upload_bytes: usize) -> Result<PdfUpload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, "Failed to read upload", max_upload_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").trim().to_string();
        if filename.is_empty() {
            return Err(AppError::BadRequest("No selected file".to_string()));
        }
        if !is_pdf_filename(&filename) {
            return Err(AppError::BadRequest(
                "Only PDF files are supported".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| upload_error(e, "Failed to read file data", max_upload_bytes))?;

        return Ok(PdfUpload { filename, data });
    }

    Err(AppError::BadRequest("No file part in the request".to_string()))
}

fn is_pdf_filename(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

/// POST /predict
async fn predict(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>> {
    // Checked before the body is touched
    let model = state
        .model()
        .ok_or_else(|| AppError::ServiceUnavailable(MODEL_NOT_LOADED.to_string()))?;

    let mut multipart = multipart.map_err(|e| {
        AppError::BadRequest(format!("No file part in the request: {}", e.body_text()))
    })?;
    let upload = read_pdf_upload(&mut multipart, state.config().server.max_upload_bytes).await?;

    let request_id = Uuid::new_v4();
    tracing::info!(
        %request_id,
        filename = %upload.filename,
        bytes = upload.data.len(),
        "Classifying document"
    );

    // Removed when dropped, whichever way the pipeline ends
    let mut file = tempfile::Builder::new()
        .prefix("predict_")
        .suffix(".pdf")
        .tempfile()?;
    file.write_all(&upload.data)?;
    file.flush()?;

    let result = classify_document(
        file.path().to_path_buf(),
        state.rasterizer(),
        state.ocr(),
        model.classifier.as_ref(),
        Some(state.config().ocr.language.as_str()),
    )
    .await;

    if let Err(e) = file.close() {
        tracing::warn!(%request_id, "Failed to remove temporary upload: {}", e);
    }

    let predictions = result?;
    tracing::info!(%request_id, pages = predictions.len(), "Document classified");

    Ok(Json(PredictResponse {
        success: true,
        filename: upload.filename,
        page_count: predictions.len(),
        predictions,
    }))
}

#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub model_type: String,
    pub model_path: String,
    pub classes: Vec<String>,
    pub supports_probability: bool,
    pub loaded_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub training_samples: Option<u64>,
    /// Remaining sidecar keys
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

/// GET /model-info
async fn model_info(State(state): State<AppState>) -> Result<Json<ModelInfoResponse>> {
    let model = state
        .model()
        .ok_or_else(|| AppError::ServiceUnavailable(MODEL_NOT_LOADED.to_string()))?;

    let metadata = model.metadata.clone().unwrap_or_default();
    let classifier = model.classifier.as_ref();

    Ok(Json(ModelInfoResponse {
        model_type: classifier.model_type().to_string(),
        model_path: model.path().display().to_string(),
        classes: classifier.classes().to_vec(),
        supports_probability: classifier.supports_probability(),
        loaded_at: model.loaded_at,
        accuracy: metadata.accuracy,
        training_samples: metadata.training_samples,
        metadata: Some(metadata.extra).filter(|extra| !extra.is_empty()),
    }))
}
