//! # edgequake-pdf2pptx
//!
//! Convert PDF slide decks to PowerPoint, erasing the watermark that sits in
//! the bottom-right corner of every page.
//!
//! ## Why this crate?
//!
//! Decks exported from slide generators often carry a small mark in the
//! same corner of every page. The pages are images once exported, so there
//! is no text box to delete. This crate rasterizes each page, paints over
//! the corner, and rebuilds a deck with one full-slide picture per page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     read the local file
//!  ├─ 2. Render    rasterize pages via pdfium (spawn_blocking)
//!  ├─ 3. Clean     per page, in order: smear the corner (or ask Gemini)
//!  │               a failed page keeps its original image
//!  └─ 4. Assemble  one picture slide per page → .pptx
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2pptx::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("deck.pdf", &config).await?;
//!     std::fs::write(&output.artifact.file_name, &output.artifact.bytes)?;
//!     eprintln!("{}/{} pages cleaned",
//!         output.stats.cleaned_pages,
//!         output.stats.total_pages);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pptx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2pptx = { version = "0.1", default-features = false }
//! ```
//!
//! ## Choosing a Backend
//!
//! | Backend | Speed | Needs | Best for |
//! |---------|-------|-------|----------|
//! | `Smear` | ms/page | nothing | Flat or vertically uniform corners (default) |
//! | `Gemini` | seconds/page | `GEMINI_API_KEY` | Textured or gradient backgrounds |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod state;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, RemovalBackend, SlideLayout};
pub use convert::{
    convert, convert_from_bytes, convert_sync, convert_to_file, inspect, write_artifact,
    Converter,
};
pub use error::{DocumentError, PageError, Pdf2PptxError, RemovalError};
pub use output::{
    Artifact, ConversionOutput, ConversionStats, DocumentMetadata, PageImage, PageStatus,
    PageSummary, ProcessedPage,
};
pub use pipeline::assemble::{PptxAssembler, PresentationAssembler};
pub use pipeline::remote::GeminiRemover;
pub use pipeline::render::{PdfiumRasterizer, Rasterizer};
pub use pipeline::watermark::{SmearRemover, WatermarkRegion, WatermarkRemover};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, ProgressSnapshot};
pub use state::{Run, RunEvent, RunState};
pub use stream::{convert_stream, convert_stream_from_bytes, PageStream};
