//! PDF handling
//!
//! Opens uploaded PDFs and renders their pages for OCR.

mod rasterizer;

use thiserror::Error;

pub use rasterizer::{MupdfRasterizer, PageRasterizer};

/// A rendered page
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Page number (1-indexed)
    pub page: usize,
    /// PNG-encoded image
    pub png: Vec<u8>,
}

/// PDF errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to load PDF: {0}")]
    LoadError(String),
    #[error("Image encoding error: {0}")]
    ImageError(String),
    #[error("MuPDF error: {0}")]
    MuPdfError(String),
}

impl From<mupdf::Error> for PdfError {
    fn from(e: mupdf::Error) -> Self {
        PdfError::MuPdfError(e.to_string())
    }
}
