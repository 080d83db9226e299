//! Document Classification Module
//!
//! Wraps the pre-trained text classifier used to label OCR'd PDF pages.
//!
//! - `model`: JSON-exported linear text model
//! - `metadata`: optional training statistics sidecar
//! - `pipeline`: rasterize → OCR → classify, one prediction per page

mod metadata;
mod model;
pub mod pipeline;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

pub use metadata::ModelMetadata;
pub use model::LinearTextModel;
pub use pipeline::{PagePrediction, PipelineError};

use crate::config::ClassifierConfig;

/// Classifier errors
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    #[error("Failed to read model: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("Invalid model metadata: {0}")]
    InvalidMetadata(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),
}

/// A pre-trained text classifier
pub trait TextClassifier: Send + Sync {
    /// Human readable model family, e.g. `LogisticRegression`
    fn model_type(&self) -> &str;

    /// Labels the model can emit
    fn classes(&self) -> &[String];

    fn supports_probability(&self) -> bool;

    fn predict(&self, text: &str) -> Result<String, ClassifierError>;

    /// Per-class probabilities in `classes()` order, `None` when unsupported
    fn predict_proba(&self, text: &str) -> Result<Option<Vec<f64>>, ClassifierError>;
}

/// Classifier loaded at startup, shared read-only by all requests
#[derive(Clone)]
pub struct LoadedModel {
    pub classifier: Arc<dyn TextClassifier>,
    pub path: PathBuf,
    pub metadata: Option<ModelMetadata>,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedModel {
    pub fn new(classifier: Arc<dyn TextClassifier>, path: impl Into<PathBuf>) -> Self {
        Self {
            classifier,
            path: path.into(),
            metadata: None,
            loaded_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Load the model and its sidecar metadata.
    ///
    /// A broken sidecar is logged and ignored; only the model itself is
    /// required.
    pub fn load(config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let model = LinearTextModel::from_path(&config.model_path)?;
        let mut loaded = Self::new(Arc::new(model), config.model_path.clone());

        match ModelMetadata::load_sidecar(&config.metadata_path) {
            Ok(Some(metadata)) => loaded = loaded.with_metadata(metadata),
            Ok(None) => {
                tracing::debug!(
                    "No model metadata at {}",
                    config.metadata_path.display()
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Ignoring model metadata at {}: {}",
                    config.metadata_path.display(),
                    e
                );
            }
        }

        Ok(loaded)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
