//! Model metadata sidecar
//!
//! Training statistics written next to the model file. The sidecar is
//! optional; unknown keys are kept and reported as-is.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ClassifierError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_samples: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModelMetadata {
    /// Read the sidecar at `path`; a missing file is not an error
    pub fn load_sidecar(path: &Path) -> Result<Option<Self>, ClassifierError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| ClassifierError::InvalidMetadata(e.to_string()))
    }
}
