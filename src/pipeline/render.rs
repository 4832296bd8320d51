//! PDF rasterisation: turn document bytes into one JPEG [`PageImage`] per page.
//!
//! ## Why a trait?
//!
//! The orchestrator only needs "bytes in, ordered page images out". Keeping
//! pdfium behind [`Rasterizer`] lets the pipeline be exercised without the
//! native library, and lets hosts plug in a different renderer.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which keeps thread-local
//! state and is not safe to drive from async tasks. The orchestrator calls
//! [`Rasterizer::rasterize`] inside `tokio::task::spawn_blocking`.
//!
//! ## Why cap pixels as well as DPI?
//!
//! A poster-sized page at 144 DPI can run to tens of thousands of pixels per
//! edge. `max_rendered_pixels` bounds either edge whatever the physical size.

use crate::config::ConversionConfig;
use crate::error::DocumentError;
use crate::output::{DocumentMetadata, PageImage};
use crate::pipeline::encode;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Produces the ordered page images of a document.
pub trait Rasterizer: Send + Sync {
    /// Render every page of `bytes`, page 0 first.
    ///
    /// Fails only for whole-document problems; the returned vector always
    /// holds one image per page.
    fn rasterize(&self, bytes: &[u8]) -> Result<Vec<PageImage>, DocumentError>;
}

/// [`Rasterizer`] backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    dpi: u32,
    max_rendered_pixels: u32,
    jpeg_quality: u8,
    password: Option<String>,
}

impl PdfiumRasterizer {
    pub fn new(dpi: u32, max_rendered_pixels: u32, jpeg_quality: u8) -> Self {
        Self {
            dpi,
            max_rendered_pixels,
            jpeg_quality,
            password: None,
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.dpi, config.max_rendered_pixels, config.jpeg_quality)
            .with_password(config.password.clone())
    }

    fn render_config(&self) -> PdfRenderConfig {
        let max = self.max_rendered_pixels as i32;
        PdfRenderConfig::new()
            .scale_page_by_factor(self.dpi as f32 / 72.0)
            .set_maximum_width(max)
            .set_maximum_height(max)
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, bytes: &[u8]) -> Result<Vec<PageImage>, DocumentError> {
        check_magic(bytes)?;

        let pdfium = bind_pdfium()?;
        let password = self.password.as_deref();
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| classify_load_error(e, password.is_some()))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        if total_pages == 0 {
            return Err(DocumentError::NoPages);
        }
        info!("PDF loaded: {} pages", total_pages);

        let render_config = self.render_config();
        let mut results = Vec::with_capacity(total_pages);

        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                DocumentError::RasterisationFailed {
                    page: idx,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            let encoded = encode::encode_jpeg(&image, self.jpeg_quality).map_err(|e| {
                DocumentError::RasterisationFailed {
                    page: idx,
                    detail: format!("JPEG encoding failed: {e}"),
                }
            })?;
            debug!(
                "Rendered page {} → {}x{} px, {} bytes",
                idx + 1,
                encoded.width(),
                encoded.height(),
                encoded.data().len()
            );

            results.push(encoded);
        }

        Ok(results)
    }
}

/// Reject input that does not start with `%PDF` before handing it to pdfium.
pub fn check_magic(bytes: &[u8]) -> Result<(), DocumentError> {
    if bytes.starts_with(b"%PDF") {
        Ok(())
    } else {
        Err(DocumentError::NotAPdf {
            magic: bytes.iter().take(4).copied().collect(),
        })
    }
}

fn classify_load_error(e: PdfiumError, had_password: bool) -> DocumentError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            DocumentError::WrongPassword
        } else {
            DocumentError::PasswordRequired
        }
    } else {
        DocumentError::Corrupt { detail: err_str }
    }
}

/// Bind to a pdfium library.
///
/// Lookup order: `PDFIUM_LIB_PATH` (the library file or the directory
/// holding it), the working directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, DocumentError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => {
            let p = Path::new(&path);
            if p.is_dir() {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(p))
            } else {
                Pdfium::bind_to_library(p)
            }
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| DocumentError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(
    bytes: Vec<u8>,
    password: Option<String>,
) -> Result<DocumentMetadata, DocumentError> {
    tokio::task::spawn_blocking(move || extract_metadata_blocking(&bytes, password.as_deref()))
        .await
        .map_err(|e| DocumentError::Corrupt {
            detail: format!("Metadata task panicked: {}", e),
        })?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(
    bytes: &[u8],
    password: Option<&str>,
) -> Result<DocumentMetadata, DocumentError> {
    check_magic(bytes)?;
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, password)
        .map_err(|e| classify_load_error(e, password.is_some()))?;

    let metadata = document.metadata();
    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}
