//! Application state management

use std::sync::Arc;

use crate::classifier::LoadedModel;
use crate::config::Config;
use crate::ocr::OcrEngine;
use crate::pdf::PageRasterizer;
use crate::scraper::PropertyScraper;

/// External collaborators the handlers call into
pub struct Services {
    pub scraper: Arc<dyn PropertyScraper>,
    pub ocr: Arc<dyn OcrEngine>,
    pub rasterizer: Arc<dyn PageRasterizer>,
    /// `None` when the classifier failed to load at startup
    pub model: Option<LoadedModel>,
}

/// Shared application state
///
/// Built once in `main`; nothing in it changes afterwards.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    services: Services,
}

impl AppState {
    pub fn new(config: Config, services: Services) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, services }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn scraper(&self) -> &dyn PropertyScraper {
        self.inner.services.scraper.as_ref()
    }

    pub fn ocr(&self) -> &dyn OcrEngine {
        self.inner.services.ocr.as_ref()
    }

    /// Owned handle, for moving into blocking tasks
    pub fn rasterizer(&self) -> Arc<dyn PageRasterizer> {
        Arc::clone(&self.inner.services.rasterizer)
    }

    /// The classifier, if one was loaded
    pub fn model(&self) -> Option<&LoadedModel> {
        self.inner.services.model.as_ref()
    }
}
