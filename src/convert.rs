//! Conversion entry points and the orchestrator that owns a run.
//!
//! [`Converter`] sequences one document through the run state machine:
//!
//! ```text
//! Idle ─Submit─▶ Extracting ─Rasterized─▶ Processing ─AllPagesDone─▶ Completed
//!                    │ DocumentFailed                                   │ Reset
//!                    ▼                                                  ▼
//!                  Idle                                               Idle
//! ```
//!
//! Pages are cleaned one at a time, in order, each on a blocking thread. A
//! page whose cleanup fails (or panics) is recorded as `Failed` with its
//! original image and the run carries on. Only a document the rasterizer
//! cannot open aborts the run, and then nothing is kept.
//!
//! The free functions ([`convert`], [`convert_to_file`], ...) build a fresh
//! `Converter` per call and also assemble the `.pptx`.

use crate::config::ConversionConfig;
use crate::error::Pdf2PptxError;
use crate::output::{Artifact, ConversionOutput, ConversionStats, DocumentMetadata, ProcessedPage};
use crate::pipeline::assemble::{PptxAssembler, PresentationAssembler};
use crate::pipeline::render::{PdfiumRasterizer, Rasterizer};
use crate::pipeline::watermark::{remover_from_config, WatermarkRemover};
use crate::pipeline::{input, render};
use crate::progress::ProgressSnapshot;
use crate::state::{Run, RunEvent, RunState};
use crate::stream;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Orchestrates rasterization, per-page cleanup, and assembly for one run
/// at a time.
pub struct Converter {
    config: ConversionConfig,
    rasterizer: Arc<dyn Rasterizer>,
    remover: Arc<dyn WatermarkRemover>,
    assembler: Arc<dyn PresentationAssembler>,
    run: Run,
    // Set while a `process` future is driving the run.
    in_flight: bool,
    render_duration_ms: u64,
    cleanup_duration_ms: u64,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("remover", &self.remover.name())
            .field("state", &self.run.state())
            .field("pages", &self.run.pages().len())
            .finish()
    }
}

impl Converter {
    /// Converter with the pdfium rasterizer, the backend named by
    /// `config.backend`, and the PPTX assembler.
    pub fn new(config: ConversionConfig) -> Result<Self, Pdf2PptxError> {
        let rasterizer = Arc::new(PdfiumRasterizer::from_config(&config));
        let remover = remover_from_config(&config)?;
        let assembler = Arc::new(PptxAssembler::from_config(&config));
        Ok(Self::with_components(config, rasterizer, remover, assembler))
    }

    /// Converter with caller-supplied stages.
    pub fn with_components(
        config: ConversionConfig,
        rasterizer: Arc<dyn Rasterizer>,
        remover: Arc<dyn WatermarkRemover>,
        assembler: Arc<dyn PresentationAssembler>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            remover,
            assembler,
            run: Run::new(),
            in_flight: false,
            render_duration_ms: 0,
            cleanup_duration_ms: 0,
        }
    }

    /// Swap the assembler, e.g. to carry a document title.
    pub fn with_assembler(mut self, assembler: Arc<dyn PresentationAssembler>) -> Self {
        self.assembler = assembler;
        self
    }

    /// Read-only view of the current run.
    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn state(&self) -> RunState {
        self.run.state()
    }

    /// Discard a completed run's pages and go back to `Idle`.
    ///
    /// Rejected with [`Pdf2PptxError::InvalidTransition`] in any other state,
    /// except after a cancelled [`process`](Self::process): that run is
    /// discarded and the call succeeds.
    pub fn reset(&mut self) -> Result<(), Pdf2PptxError> {
        if self.discard_abandoned() {
            return Ok(());
        }
        self.apply(RunEvent::Reset)?;
        self.render_duration_ms = 0;
        self.cleanup_duration_ms = 0;
        Ok(())
    }

    /// Rasterize `bytes` and clean every page, in order.
    ///
    /// Returns exactly one [`ProcessedPage`] per page with indices `0..N`.
    /// The run is left in `Completed` holding the same pages; call
    /// [`reset`](Self::reset) before submitting another document.
    ///
    /// # Cancellation
    /// Dropping the future mid-run (e.g. under `tokio::time::timeout`) leaves
    /// [`state`](Self::state) at `Extracting` or `Processing`. The page being
    /// cleaned at that moment still runs to completion on its blocking thread.
    /// The next `process` or `reset` discards the abandoned run first.
    ///
    /// # Errors
    /// - [`Pdf2PptxError::InvalidTransition`] if the run is not `Idle`
    /// - [`Pdf2PptxError::Document`] if the rasterizer rejects the document;
    ///   the run is back in `Idle` with no pages
    pub async fn process(&mut self, bytes: Vec<u8>) -> Result<Vec<ProcessedPage>, Pdf2PptxError> {
        self.discard_abandoned();
        self.apply(RunEvent::Submit)?;
        self.in_flight = true;

        let render_start = Instant::now();
        let originals = match stream::rasterize(Arc::clone(&self.rasterizer), bytes).await {
            Ok(pages) => pages,
            Err(e) => {
                warn!("Document rejected: {}", e);
                self.in_flight = false;
                self.apply(RunEvent::DocumentFailed)?;
                return Err(e.into());
            }
        };
        self.render_duration_ms = render_start.elapsed().as_millis() as u64;
        let total = originals.len();
        info!(
            "Rasterized {} pages in {}ms",
            total, self.render_duration_ms
        );

        self.apply(RunEvent::Rasterized)?;
        let callback = self.config.progress_callback.clone();
        if let Some(ref cb) = callback {
            cb.on_conversion_start(total);
        }

        let cleanup_start = Instant::now();
        for (index, original) in originals.into_iter().enumerate() {
            let progress_percent = self.run.begin_page(index, total);
            if let Some(ref cb) = callback {
                cb.on_page_start(index, total, progress_percent);
            }

            let page = stream::clean_page(Arc::clone(&self.remover), index, original).await;
            debug!(
                page = index + 1,
                status = ?page.status,
                ms = page.duration_ms,
                "Page processed"
            );

            if let Some(ref cb) = callback {
                if let Some(ref err) = page.error {
                    cb.on_page_error(index, total, err);
                }
            }
            let snapshot = ProgressSnapshot {
                state: self.run.state(),
                progress_percent,
                processed_count: index + 1,
                total_pages: total,
                most_recent_original: page.original.clone(),
            };
            self.run.push_page(page);
            if let Some(ref cb) = callback {
                cb.on_page_complete(&snapshot);
            }
        }
        self.cleanup_duration_ms = cleanup_start.elapsed().as_millis() as u64;

        self.in_flight = false;
        self.apply(RunEvent::AllPagesDone)?;
        let pages = self.run.pages().to_vec();
        let cleaned = pages.iter().filter(|p| p.is_success()).count();
        info!(
            "Cleaned {}/{} pages with {} in {}ms",
            cleaned,
            total,
            self.remover.name(),
            self.cleanup_duration_ms
        );
        if let Some(ref cb) = callback {
            cb.on_conversion_complete(total, cleaned);
        }
        Ok(pages)
    }

    /// [`process`](Self::process) followed by assembly.
    pub async fn convert_bytes(
        &mut self,
        bytes: Vec<u8>,
    ) -> Result<ConversionOutput, Pdf2PptxError> {
        let total_start = Instant::now();
        let pages = self.process(bytes).await?;
        let artifact = self.assembler.assemble(&pages)?;

        let cleaned_pages = pages.iter().filter(|p| p.is_success()).count();
        let stats = ConversionStats {
            total_pages: pages.len(),
            cleaned_pages,
            failed_pages: pages.len() - cleaned_pages,
            render_duration_ms: self.render_duration_ms,
            cleanup_duration_ms: self.cleanup_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        Ok(ConversionOutput {
            pages,
            metadata: None,
            stats,
            artifact,
        })
    }

    /// Read the file at `path` and run [`convert_bytes`](Self::convert_bytes).
    pub async fn convert_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<ConversionOutput, Pdf2PptxError> {
        let bytes = input::read_input(path.as_ref()).await?;
        self.convert_bytes(bytes).await
    }

    /// Drop a run whose `process` future never finished. Returns true if
    /// there was one.
    fn discard_abandoned(&mut self) -> bool {
        if !self.in_flight {
            return false;
        }
        warn!(
            state = ?self.run.state(),
            pages = self.run.pages().len(),
            "Discarding a run that was cancelled mid-way"
        );
        self.in_flight = false;
        self.run.discard();
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_state_change(RunState::Idle);
        }
        true
    }

    fn apply(&mut self, event: RunEvent) -> Result<RunState, Pdf2PptxError> {
        let next = self.run.apply(event)?;
        debug!(?event, state = ?next, "Run transition");
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_state_change(next);
        }
        Ok(next)
    }
}

/// Convert the PDF at `path` to a cleaned presentation.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` even if some pages could not be cleaned
/// (check `output.stats.failed_pages`, or call `into_result()`).
///
/// # Errors
/// Returns `Err(Pdf2PptxError)` only for fatal errors:
/// - file not found / permission denied
/// - not a PDF, encrypted, or corrupt
/// - the remote backend is selected without an API key
pub async fn convert(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PptxError> {
    let path = path.as_ref();
    info!("Starting conversion: {}", path.display());
    let bytes = input::read_input(path).await?;
    convert_from_bytes(bytes, config).await
}

/// Convert PDF bytes already in memory.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2pptx::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("deck.pdf")?;
/// let output = convert_from_bytes(bytes, &ConversionConfig::default()).await?;
/// std::fs::write(&output.artifact.file_name, &output.artifact.bytes)?;
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: Vec<u8>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PptxError> {
    // Metadata only feeds the deck title; the run reports document errors.
    let metadata = match render::extract_metadata(bytes.clone(), config.password.clone()).await {
        Ok(m) => Some(m),
        Err(e) => {
            debug!("Metadata unavailable: {}", e);
            None
        }
    };
    let title = metadata.as_ref().and_then(|m| m.title.clone());
    let assembler = Arc::new(PptxAssembler::from_config(config).with_title(title));

    let mut converter = Converter::new(config.clone())?.with_assembler(assembler);
    let mut output = converter.convert_bytes(bytes).await?;
    output.metadata = metadata;

    info!(
        "Conversion complete: {}/{} pages cleaned, {}ms total",
        output.stats.cleaned_pages, output.stats.total_pages, output.stats.total_duration_ms
    );
    Ok(output)
}

/// Convert a PDF and write the presentation to `output_path`, or next to
/// the input under `config.output_file_name` when `None`.
///
/// Uses an atomic write (temp file + rename) so a failed run never leaves
/// a truncated deck behind.
pub async fn convert_to_file(
    path: impl AsRef<Path>,
    output_path: Option<&Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2PptxError> {
    let path = path.as_ref();
    let output = convert(path, config).await?;
    let target = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input::default_output_path(path, &config.output_file_name));
    write_artifact(&output.artifact, &target).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PptxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2PptxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(path, config))
}

/// Extract PDF metadata without rasterizing or cleaning anything.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentMetadata, Pdf2PptxError> {
    let bytes = input::read_input(path.as_ref()).await?;
    Ok(render::extract_metadata(bytes, None).await?)
}

/// Write `artifact` to `path` atomically, creating parent directories.
pub async fn write_artifact(artifact: &Artifact, path: &Path) -> Result<(), Pdf2PptxError> {
    let bytes = artifact.bytes.clone();
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic(&target, &bytes))
        .await
        .map_err(|e| Pdf2PptxError::Internal(format!("write task failed: {e}")))??;
    info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Pdf2PptxError> {
    let fail = |source: std::io::Error| Pdf2PptxError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    let parent: PathBuf = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(fail)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(fail)?;
    tmp.write_all(bytes).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;
    tmp.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}
