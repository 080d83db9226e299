//! OCR Providers
//!
//! Defines the engine trait and implementations for the supported backends.

use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::types::{OcrError, OcrProvider};

/// OCR engine trait
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Get the provider type
    fn provider_type(&self) -> OcrProvider;

    /// Check if the engine can currently be used
    async fn is_available(&self) -> bool;

    /// Recognize the text in an encoded page image
    async fn recognize(&self, image_data: &[u8], language: Option<&str>) -> Result<String, OcrError>;
}

/// Tesseract OCR provider
///
/// Streams the image through `tesseract stdin stdout`; no scratch files.
pub struct TesseractProvider {
    command: String,
    default_language: String,
}

impl TesseractProvider {
    pub fn new(command: &str, default_language: &str) -> Self {
        Self {
            command: command.to_string(),
            default_language: default_language.to_string(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    async fn recognize(&self, image_data: &[u8], language: Option<&str>) -> Result<String, OcrError> {
        let lang = language.unwrap_or(&self.default_language);

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "-l", lang, "--oem", "3", "--psm", "3"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                OcrError::ProviderNotAvailable(format!("Failed to run {}: {}", self.command, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image_data)
                .await
                .map_err(|e| OcrError::ProcessingError(format!("Failed to send image: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| OcrError::ProcessingError(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingError(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Ollama vision model provider
///
/// Sends each page to `POST /api/generate` as a base64 image and reads the
/// transcription back from the non-streaming response.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    /// Model name, e.g. "llava" or "llava:13b"
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    images: [String; 1],
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Untagged model names match their `:latest` tag
    fn is_configured_model(&self, name: &str) -> bool {
        name == self.model || name.strip_suffix(":latest") == Some(self.model.as_str())
    }

    fn prompt(language: Option<&str>) -> String {
        let mut prompt = String::from(
            "Transcribe all text on this scanned document page exactly as written, \
             preserving line breaks.",
        );
        if let Some(language) = language {
            prompt.push_str(&format!(" The page is written in language '{}'.", language));
        }
        prompt.push_str(" Reply with the transcription only.");
        prompt
    }
}

#[async_trait]
impl OcrEngine for OllamaProvider {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Ollama
    }

    /// The server must answer and have the configured model pulled
    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            _ => return false,
        };

        match response.json::<TagsResponse>().await {
            Ok(tags) => tags.models.iter().any(|tag| self.is_configured_model(&tag.name)),
            Err(_) => false,
        }
    }

    async fn recognize(&self, image_data: &[u8], language: Option<&str>) -> Result<String, OcrError> {
        use base64::Engine;

        let request = GenerateRequest {
            model: &self.model,
            prompt: Self::prompt(language),
            images: [base64::engine::general_purpose::STANDARD.encode(image_data)],
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    OcrError::ProviderNotAvailable(format!("Ollama unreachable: {}", e))
                } else {
                    OcrError::ApiError(format!("Failed to call Ollama: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(OcrError::ProviderNotAvailable(format!(
                "Ollama model '{}' is not installed",
                self.model
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::ApiError(format!("Ollama returned {}: {}", status, body.trim())));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OcrError::ApiError(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(generated.response.trim().to_string())
    }
}
