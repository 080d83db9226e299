//! OCR Module
//!
//! Turns rendered page images into plain text.
//!
//! Supports two backends:
//! - Tesseract (local, requires the `tesseract` binary)
//! - Ollama vision models (local LLM)

mod provider;
mod types;

use std::sync::Arc;

pub use provider::{OcrEngine, OllamaProvider, TesseractProvider};
pub use types::{OcrError, OcrProvider};

use crate::config::OcrConfig;

/// Build the engine selected in configuration
pub fn engine_from_config(config: &OcrConfig) -> Arc<dyn OcrEngine> {
    match config.provider {
        OcrProvider::Tesseract => Arc::new(TesseractProvider::new(
            &config.tesseract_cmd,
            &config.language,
        )),
        OcrProvider::Ollama => Arc::new(OllamaProvider::new(
            &config.ollama_url,
            &config.ollama_model,
        )),
    }
}
