//! Shared fixtures: in-process stand-ins for the scraping backend, OCR
//! engine, rasterizer and classifier.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;

use propdata_server::classifier::{ClassifierError, LoadedModel, TextClassifier};
use propdata_server::config::Config;
use propdata_server::ocr::{OcrEngine, OcrError, OcrProvider};
use propdata_server::pdf::{PageImage, PageRasterizer, PdfError};
use propdata_server::scraper::{PropertyQuery, PropertyScraper, PropertyTable, ScraperError};
use propdata_server::{app, AppState, Services};

pub enum ScrapeOutcome {
    Rows(PropertyTable),
    Invalid(String),
    Unreachable,
}

pub struct MockScraper {
    outcome: ScrapeOutcome,
    pub queries: Mutex<Vec<PropertyQuery>>,
}

impl MockScraper {
    pub fn new(outcome: ScrapeOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn last_query(&self) -> Option<PropertyQuery> {
        self.queries.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl PropertyScraper for MockScraper {
    async fn scrape(&self, query: &PropertyQuery) -> Result<PropertyTable, ScraperError> {
        self.queries.lock().unwrap().push(query.clone());
        match &self.outcome {
            ScrapeOutcome::Rows(table) => Ok(table.clone()),
            ScrapeOutcome::Invalid(message) => Err(ScraperError::InvalidInput(message.clone())),
            ScrapeOutcome::Unreachable => Err(ScraperError::Request("connection refused".into())),
        }
    }
}

/// Treats the "image" bytes as the page text
pub struct MockOcr {
    pub calls: AtomicUsize,
    fail_on_page: Option<usize>,
}

impl MockOcr {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on_page: None,
        })
    }

    pub fn failing_on(page: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on_page: Some(page),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    fn provider_type(&self) -> OcrProvider {
        OcrProvider::Tesseract
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn recognize(&self, image_data: &[u8], _language: Option<&str>) -> Result<String, OcrError> {
        let page = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_page == Some(page) {
            return Err(OcrError::ProcessingError(format!("page {} unreadable", page)));
        }
        Ok(String::from_utf8_lossy(image_data).into_owned())
    }
}

/// Produces a fixed list of page texts and remembers which files it opened
pub struct MockRasterizer {
    pages: Vec<String>,
    pub calls: AtomicUsize,
    pub paths: Mutex<Vec<PathBuf>>,
}

impl MockRasterizer {
    pub fn new(pages: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }
}

impl PageRasterizer for MockRasterizer {
    fn render_pages(&self, path: &Path) -> Result<Vec<PageImage>, PdfError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path.to_path_buf());

        let bytes = std::fs::read(path).map_err(|e| PdfError::LoadError(e.to_string()))?;
        if !bytes.starts_with(b"%PDF") {
            return Err(PdfError::LoadError("missing PDF header".into()));
        }

        Ok(self
            .pages
            .iter()
            .enumerate()
            .map(|(i, text)| PageImage {
                page: i + 1,
                png: text.as_bytes().to_vec(),
            })
            .collect())
    }
}

/// Keyword classifier without probability support
pub struct KeywordClassifier {
    classes: Vec<String>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            classes: vec!["lease".into(), "invoice".into(), "other".into()],
        }
    }
}

impl TextClassifier for KeywordClassifier {
    fn model_type(&self) -> &str {
        "KeywordClassifier"
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn supports_probability(&self) -> bool {
        false
    }

    fn predict(&self, text: &str) -> Result<String, ClassifierError> {
        let text = text.to_lowercase();
        let label = if text.contains("tenant") {
            "lease"
        } else if text.contains("invoice") {
            "invoice"
        } else {
            "other"
        };
        Ok(label.to_string())
    }

    fn predict_proba(&self, _text: &str) -> Result<Option<Vec<f64>>, ClassifierError> {
        Ok(None)
    }
}

pub struct TestBackends {
    pub config: Config,
    pub scraper: Arc<MockScraper>,
    pub ocr: Arc<MockOcr>,
    pub rasterizer: Arc<MockRasterizer>,
    pub model: Option<LoadedModel>,
}

impl TestBackends {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            scraper: MockScraper::new(ScrapeOutcome::Rows(PropertyTable::default())),
            ocr: MockOcr::new(),
            rasterizer: MockRasterizer::new(&["The tenant agrees", "INVOICE 001", "misc notes"]),
            model: Some(LoadedModel::new(
                Arc::new(KeywordClassifier::new()),
                "models/keyword.json",
            )),
        }
    }

    pub fn app(&self) -> Router {
        let services = Services {
            scraper: self.scraper.clone(),
            ocr: self.ocr.clone(),
            rasterizer: self.rasterizer.clone(),
            model: self.model.clone(),
        };
        app(AppState::new(self.config.clone(), services))
    }
}

pub const BOUNDARY: &str = "propdata-test-boundary";

/// Hand-built multipart body with one field
pub fn multipart_body(field: &str, filename: Option<&str>, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    match filename {
        Some(filename) => body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        ),
        None => body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", field).as_bytes(),
        ),
    }
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub const FAKE_PDF: &[u8] = b"%PDF-1.4\n% test document\n%%EOF\n";
