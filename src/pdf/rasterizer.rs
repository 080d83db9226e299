//! Page rasterization using MuPDF
//!
//! Renders every page of a PDF file to PNG so the pages can be fed to an
//! OCR engine.

use std::io::Cursor;
use std::path::Path;

use mupdf::{Colorspace, Document, Matrix};

use super::{PageImage, PdfError};

/// Points per inch in PDF user space
const POINTS_PER_INCH: f32 = 72.0;

/// Largest page image handed to OCR (about 16k x 16k)
const MAX_PIXELS: usize = 256 * 1024 * 1024;

/// Converts PDF pages into images
///
/// Implementations are synchronous; callers run them on the blocking pool.
pub trait PageRasterizer: Send + Sync {
    fn render_pages(&self, path: &Path) -> Result<Vec<PageImage>, PdfError>;
}

/// MuPDF-backed rasterizer
pub struct MupdfRasterizer {
    dpi: u32,
}

impl MupdfRasterizer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    /// Render scale for the configured DPI, clamped to keep pixmaps sane
    fn scale(&self) -> f32 {
        (self.dpi as f32 / POINTS_PER_INCH).clamp(0.5, 8.0)
    }
}

impl PageRasterizer for MupdfRasterizer {
    fn render_pages(&self, path: &Path) -> Result<Vec<PageImage>, PdfError> {
        let path_str = path.to_string_lossy();
        let doc = Document::open(&*path_str).map_err(|e| PdfError::LoadError(e.to_string()))?;
        let page_count = doc.page_count()? as usize;

        tracing::debug!(pages = page_count, dpi = self.dpi, "Rasterizing PDF");

        let matrix = Matrix::new_scale(self.scale(), self.scale());
        let colorspace = Colorspace::device_rgb();

        let mut pages = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let page = doc.load_page(index as i32)?;
            let pixmap = page.to_pixmap(&matrix, &colorspace, false, true)?;
            let png = encode_png(&pixmap)?;
            pages.push(PageImage {
                page: index + 1,
                png,
            });
        }

        Ok(pages)
    }
}

/// Encode an RGB(A) pixmap as PNG
fn encode_png(pixmap: &mupdf::Pixmap) -> Result<Vec<u8>, PdfError> {
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let pixels = pixel_count(width, height)?;
    let samples = pixmap.samples();
    let n = pixmap.n() as usize;

    let mut rgb = Vec::with_capacity(pixels * 3);
    for pixel in 0..pixels {
        let offset = pixel * n;
        let r = samples.get(offset).copied().unwrap_or(255);
        let g = samples.get(offset + 1).copied().unwrap_or(r);
        let b = samples.get(offset + 2).copied().unwrap_or(r);
        rgb.extend_from_slice(&[r, g, b]);
    }

    let img = image::RgbImage::from_raw(width as u32, height as u32, rgb)
        .ok_or_else(|| PdfError::ImageError("Failed to create image buffer".to_string()))?;

    let mut output = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut output), image::ImageFormat::Png)
        .map_err(|e| PdfError::ImageError(e.to_string()))?;

    Ok(output)
}

/// Pixel count of a `width` x `height` image, refusing oversized pages
fn pixel_count(width: usize, height: usize) -> Result<usize, PdfError> {
    width
        .checked_mul(height)
        .filter(|&pixels| pixels <= MAX_PIXELS)
        .ok_or_else(|| {
            PdfError::ImageError(format!(
                "Rendered page is too large ({}x{} pixels); lower OCR_DPI",
                width, height
            ))
        })
}
