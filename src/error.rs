//! Error types for the edgequake-pdf2pptx library.
//!
//! Three error types map onto three failure scopes:
//!
//! * [`Pdf2PptxError`]: **fatal**, the run cannot produce a deck at all
//!   (missing input, invalid configuration, nothing to assemble). Returned as
//!   `Err(Pdf2PptxError)` from the top-level `convert*` functions.
//!
//! * [`DocumentError`]: the rasterizer could not turn the input bytes into
//!   pages. Always fatal to the run; wrapped by [`Pdf2PptxError::Document`].
//!
//! * [`PageError`]: **non-fatal**, cleaning one page failed. Stored on the
//!   [`crate::output::ProcessedPage`] that fell back to its original image,
//!   so a single bad page never costs the user the rest of the deck.

use crate::state::{RunEvent, RunState};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2pptx library.
///
/// Page-level failures use [`PageError`] and are stored in
/// [`crate::output::ProcessedPage`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Pdf2PptxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Document errors ───────────────────────────────────────────────────
    /// The rasterizer rejected the document. The run is back in `Idle`.
    #[error(transparent)]
    Document(#[from] DocumentError),

    // ── Run errors ────────────────────────────────────────────────────────
    /// An event arrived that the run state machine does not accept in its
    /// current state (e.g. `reset` while still processing).
    #[error("Cannot apply {event:?} while the run is {state:?}")]
    InvalidTransition { state: RunState, event: RunEvent },

    /// Some pages were cleaned but at least one fell back to its original.
    ///
    /// Returned by [`crate::output::ConversionOutput::into_result`] when
    /// the caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages could not be cleaned")]
    PartialFailure {
        cleaned: usize,
        failed: usize,
        total: usize,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The assembler was handed zero pages; a deck needs at least one slide.
    #[error("Cannot assemble a presentation with no slides")]
    EmptyPresentation,

    /// Packaging the presentation archive failed.
    #[error("Failed to assemble presentation: {0}")]
    AssemblyFailed(String),

    /// Could not create or write the output presentation file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The input bytes could not be turned into page images.
#[derive(Debug, Clone, Error)]
pub enum DocumentError {
    /// The bytes do not start with the `%PDF` magic.
    #[error("Input is not a valid PDF (first bytes: {magic:?})")]
    NotAPdf { magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    Corrupt { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF")]
    WrongPassword,

    /// The document parsed but contains no pages.
    #[error("PDF contains no pages")]
    NoPages,

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory), place the library\n\
in the working directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),
}

/// A non-fatal error for a single page.
///
/// Stored on [`crate::output::ProcessedPage`] when a page falls back to its
/// original image. The run continues with the next page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The remover reported a failure for this page.
    #[error("Page {page}: cleanup failed: {detail}")]
    Cleanup { page: usize, detail: String },

    /// A working buffer could not be allocated or encoded.
    #[error("Page {page}: out of resources: {detail}")]
    Resource { page: usize, detail: String },

    /// The remover panicked; caught by the orchestrator.
    #[error("Page {page}: remover panicked: {detail}")]
    Panicked { page: usize, detail: String },

    /// The remote removal service failed or returned no image.
    #[error("Page {page}: remote removal failed: {detail}")]
    Remote { page: usize, detail: String },
}

/// Failure reported by a [`crate::pipeline::watermark::WatermarkRemover`].
///
/// Carries no page index; the orchestrator attaches one when it turns the
/// failure into a [`PageError`].
#[derive(Debug, Clone, Error)]
pub enum RemovalError {
    #[error("{0}")]
    Cleanup(String),
    #[error("{0}")]
    Resource(String),
    #[error("{0}")]
    Remote(String),
}

impl RemovalError {
    pub fn into_page_error(self, page: usize) -> PageError {
        match self {
            RemovalError::Cleanup(detail) => PageError::Cleanup { page, detail },
            RemovalError::Resource(detail) => PageError::Resource { page, detail },
            RemovalError::Remote(detail) => PageError::Remote { page, detail },
        }
    }
}

impl From<image::ImageError> for RemovalError {
    fn from(e: image::ImageError) -> Self {
        match &e {
            image::ImageError::Limits(_) => RemovalError::Resource(e.to_string()),
            _ => RemovalError::Cleanup(e.to_string()),
        }
    }
}

impl PageError {
    /// 0-based index of the page this error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::Cleanup { page, .. }
            | PageError::Resource { page, .. }
            | PageError::Panicked { page, .. }
            | PageError::Remote { page, .. } => *page,
        }
    }
}
