//! Page classification pipeline
//!
//! Rasterize, then OCR and classify each page in order. The first page
//! that fails aborts the whole document.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use super::{ClassifierError, TextClassifier};
use crate::ocr::{OcrEngine, OcrError};
use crate::pdf::{PageImage, PageRasterizer, PdfError};

/// Prediction for a single page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePrediction {
    /// Page number (1-indexed)
    pub page: usize,
    pub predicted_label: String,
    /// Highest class probability, `None` without probability support
    pub confidence: Option<f64>,
    /// Characters of OCR text fed to the classifier
    pub text_length: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("OCR failed on page {page}: {source}")]
    Ocr {
        page: usize,
        #[source]
        source: OcrError,
    },

    #[error("Classification failed on page {page}: {source}")]
    Classify {
        page: usize,
        #[source]
        source: ClassifierError,
    },

    #[error("Rasterizer task failed: {0}")]
    Task(String),
}

/// Render `path` on the blocking pool and classify every page
pub async fn classify_document(
    path: PathBuf,
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: &dyn OcrEngine,
    classifier: &dyn TextClassifier,
    language: Option<&str>,
) -> Result<Vec<PagePrediction>, PipelineError> {
    let pages = tokio::task::spawn_blocking(move || rasterizer.render_pages(&path))
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;

    classify_pages(pages, ocr, classifier, language).await
}

/// OCR and classify already rendered pages
pub async fn classify_pages(
    pages: Vec<PageImage>,
    ocr: &dyn OcrEngine,
    classifier: &dyn TextClassifier,
    language: Option<&str>,
) -> Result<Vec<PagePrediction>, PipelineError> {
    let mut predictions = Vec::with_capacity(pages.len());

    for (index, image) in pages.into_iter().enumerate() {
        let page = index + 1;

        let text = ocr
            .recognize(&image.png, language)
            .await
            .map_err(|source| PipelineError::Ocr { page, source })?;

        let predicted_label = classifier
            .predict(&text)
            .map_err(|source| PipelineError::Classify { page, source })?;

        let confidence = classifier
            .predict_proba(&text)
            .map_err(|source| PipelineError::Classify { page, source })?
            .and_then(|probabilities| probabilities.into_iter().reduce(f64::max));

        let text_length = text.chars().count();

        tracing::debug!(
            page,
            label = %predicted_label,
            confidence = ?confidence,
            text_length,
            "Page classified"
        );

        predictions.push(PagePrediction {
            page,
            predicted_label,
            confidence,
            text_length,
        });
    }

    Ok(predictions)
}
