//! Progress-callback trait for per-page conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to observe a
//! run as it moves through its states and cleans each page.
//!
//! The orchestrator invokes the callback between its own suspension points,
//! so observers only ever see a consistent view of the run. Forward the
//! events wherever the host needs them: a terminal progress bar, a channel,
//! a WebSocket.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2pptx::{ConversionProgressCallback, ConversionConfig, ProgressSnapshot};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl ConversionProgressCallback for Printer {
//!     fn on_page_complete(&self, snapshot: &ProgressSnapshot) {
//!         eprintln!("{}/{} pages ({:.0}%)",
//!             snapshot.processed_count, snapshot.total_pages, snapshot.progress_percent);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageError;
use crate::output::PageImage;
use crate::state::RunState;
use std::sync::Arc;

/// What an observer can see of the run after each page.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub state: RunState,
    /// Monotonic, `0.0..=100.0`; reaches 100 only once the run is `Completed`.
    pub progress_percent: f64,
    /// Pages finished so far, including failed ones.
    pub processed_count: usize,
    pub total_pages: usize,
    /// Original image of the page that just finished, for previews.
    pub most_recent_original: PageImage,
}

/// Called by the orchestrator as a run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed in order, one at a time, so
/// `on_page_*` calls never overlap.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called on every state transition, including the return to `Idle`
    /// after a document failure.
    fn on_state_change(&self, state: RunState) {
        let _ = state;
    }

    /// Called once rasterisation has produced `total_pages` images.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before page `index` (0-based) is cleaned.
    ///
    /// `progress_percent` is `index / total_pages * 100`.
    fn on_page_start(&self, index: usize, total_pages: usize, progress_percent: f64) {
        let _ = (index, total_pages, progress_percent);
    }

    /// Called after each page has been recorded, whatever its status.
    fn on_page_complete(&self, snapshot: &ProgressSnapshot) {
        let _ = snapshot;
    }

    /// Called when a page fell back to its original image. Followed by
    /// [`Self::on_page_complete`] for the same page.
    fn on_page_error(&self, index: usize, total_pages: usize, error: &PageError) {
        let _ = (index, total_pages, error);
    }

    /// Called once after every page has been attempted.
    fn on_conversion_complete(&self, total_pages: usize, cleaned_count: usize) {
        let _ = (total_pages, cleaned_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
