//! Configuration management for the PropertyData server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

use crate::ocr::OcrProvider;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub scraper: ScraperConfig,
    pub classifier: ClassifierConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for `/predict` request bodies
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Base URL of the property scraping backend
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub metadata_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub provider: OcrProvider,
    pub language: String,
    /// Rasterization resolution for OCR input
    pub dpi: u32,
    pub tesseract_cmd: String,
    pub ollama_url: String,
    pub ollama_model: String,
}

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;
const DEFAULT_MODEL_PATH: &str = "document_classifier.json";
const DEFAULT_DPI: u32 = 200;

impl Default for Config {
    fn default() -> Self {
        let model_path = PathBuf::from(DEFAULT_MODEL_PATH);
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: DEFAULT_PORT,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            scraper: ScraperConfig {
                base_url: "http://localhost:8000".to_string(),
            },
            classifier: ClassifierConfig {
                metadata_path: sidecar_path(&model_path),
                model_path,
            },
            ocr: OcrConfig {
                provider: OcrProvider::Tesseract,
                language: "eng".to_string(),
                dpi: DEFAULT_DPI,
                tesseract_cmd: "tesseract".to_string(),
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llava".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.classifier.model_path);
        let metadata_path = env::var("MODEL_METADATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| sidecar_path(&model_path));

        let provider = match env::var("OCR_PROVIDER") {
            Ok(value) => match value.to_lowercase().as_str() {
                "tesseract" => OcrProvider::Tesseract,
                "ollama" => OcrProvider::Ollama,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "OCR_PROVIDER",
                        value,
                    })
                }
            },
            Err(_) => defaults.ocr.provider,
        };

        Ok(Config {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or(defaults.server.host),
                port: parse_var("PORT", defaults.server.port)?,
                max_upload_bytes: parse_var("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
            },
            scraper: ScraperConfig {
                base_url: env::var("SCRAPER_URL").unwrap_or(defaults.scraper.base_url),
            },
            classifier: ClassifierConfig {
                model_path,
                metadata_path,
            },
            ocr: OcrConfig {
                provider,
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                dpi: parse_var("OCR_DPI", defaults.ocr.dpi)?,
                tesseract_cmd: env::var("TESSERACT_CMD").unwrap_or(defaults.ocr.tesseract_cmd),
                ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: env::var("OLLAMA_MODEL").unwrap_or(defaults.ocr.ollama_model),
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}

/// `models/clf.json` -> `models/clf_metadata.json`
fn sidecar_path(model_path: &std::path::Path) -> PathBuf {
    let stem = model_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    model_path.with_file_name(format!("{}_metadata.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.ocr.dpi, 200);
        assert_eq!(
            config.classifier.metadata_path,
            PathBuf::from("document_classifier_metadata.json")
        );
    }

    #[test]
    fn test_sidecar_path_keeps_directory() {
        let path = sidecar_path(std::path::Path::new("models/clf.json"));
        assert_eq!(path, PathBuf::from("models/clf_metadata.json"));
    }
}
