//! Streaming API: emit cleaned pages one at a time, in page order.
//!
//! ## Why stream?
//!
//! A long deck takes a while to clean, remotely especially. A stream lets
//! callers show each page as soon as it is ready, or write pages somewhere
//! incrementally, without waiting for the whole document.
//!
//! Unlike [`crate::convert::convert`], which also assembles the deck,
//! [`convert_stream`] yields bare [`ProcessedPage`] items and leaves assembly
//! to the caller. Pages are cleaned strictly one after another, so items
//! always arrive in index order.
//!
//! Every item is a [`ProcessedPage`], never an error: a remover failure or
//! panic on one page is recorded on that page (status `Failed`, cleaned =
//! original) and the stream moves on.

use crate::config::ConversionConfig;
use crate::error::{DocumentError, PageError, Pdf2PptxError};
use crate::output::{PageImage, ProcessedPage};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::watermark::{remover_from_config, WatermarkRemover};
use crate::pipeline::input;
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::Stream;
use tracing::{info, warn};

/// A boxed stream of processed pages.
pub type PageStream = Pin<Box<dyn Stream<Item = ProcessedPage> + Send>>;

/// Clean one page on a blocking thread.
///
/// Never fails: an `Err` from the remover, a panic inside it, or a result
/// whose size differs from the original all produce a `Failed` page that
/// carries the original as its cleaned image.
pub async fn clean_page(
    remover: Arc<dyn WatermarkRemover>,
    index: usize,
    original: PageImage,
) -> ProcessedPage {
    let start = Instant::now();
    let input = original.clone();
    let outcome = tokio::task::spawn_blocking(move || remover.remove(&input)).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    let error = match outcome {
        Ok(Ok(cleaned))
            if (cleaned.width(), cleaned.height()) == (original.width(), original.height()) =>
        {
            return ProcessedPage::success(index, original, cleaned, duration_ms);
        }
        Ok(Ok(cleaned)) => PageError::Cleanup {
            page: index,
            detail: format!(
                "remover changed page size from {}x{} to {}x{}",
                original.width(),
                original.height(),
                cleaned.width(),
                cleaned.height()
            ),
        },
        Ok(Err(e)) => e.into_page_error(index),
        Err(join) if join.is_panic() => PageError::Panicked {
            page: index,
            detail: panic_message(join.into_panic()),
        },
        Err(join) => PageError::Panicked {
            page: index,
            detail: join.to_string(),
        },
    };

    warn!("Page {} kept its original image: {}", index + 1, error);
    ProcessedPage::failed(index, original, error, duration_ms)
}

/// Stream `pages` through `remover`, page 0 first.
///
/// The next page is not started until the previous one has been yielded.
pub fn clean_pages(pages: Vec<PageImage>, remover: Arc<dyn WatermarkRemover>) -> PageStream {
    let s = stream::iter(pages.into_iter().enumerate())
        .then(move |(index, original)| clean_page(Arc::clone(&remover), index, original));
    Box::pin(s)
}

/// Rasterize the PDF at `path` and stream its cleaned pages.
///
/// # Returns
/// - `Ok(PageStream)`: one item per page, in order
/// - `Err(Pdf2PptxError)`: the file could not be read or rasterized
pub async fn convert_stream(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<PageStream, Pdf2PptxError> {
    let path = path.as_ref();
    info!("Starting streaming conversion: {}", path.display());
    let bytes = input::read_input(path).await?;
    convert_stream_from_bytes(bytes, config).await
}

/// Streaming equivalent of [`crate::convert::convert_from_bytes`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2pptx::{convert_stream_from_bytes, ConversionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("deck.pdf")?;
/// let config = ConversionConfig::default();
/// let mut pages = convert_stream_from_bytes(bytes, &config).await?;
/// while let Some(page) = pages.next().await {
///     println!("page {}: {:?}", page.index, page.status);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_stream_from_bytes(
    bytes: Vec<u8>,
    config: &ConversionConfig,
) -> Result<PageStream, Pdf2PptxError> {
    let remover = remover_from_config(config)?;
    let rasterizer: Arc<dyn Rasterizer> = Arc::new(PdfiumRasterizer::from_config(config));
    let pages = rasterize(rasterizer, bytes).await?;
    Ok(clean_pages(pages, remover))
}

/// Run a rasterizer on a blocking thread. An empty result is `NoPages`.
pub(crate) async fn rasterize(
    rasterizer: Arc<dyn Rasterizer>,
    bytes: Vec<u8>,
) -> Result<Vec<PageImage>, DocumentError> {
    let pages = tokio::task::spawn_blocking(move || rasterizer.rasterize(&bytes))
        .await
        .map_err(|e| DocumentError::Corrupt {
            detail: format!("Rasterizer task failed: {}", e),
        })??;
    if pages.is_empty() {
        return Err(DocumentError::NoPages);
    }
    Ok(pages)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("remover panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("remover panicked: {s}")
    } else {
        "remover panicked".to_string()
    }
}
