//! CLI binary for edgequake-pdf2pptx.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2pptx::pipeline::input::default_output_path;
use edgequake_pdf2pptx::pipeline::remote::DEFAULT_GEMINI_MODEL;
use edgequake_pdf2pptx::{
    convert, inspect, write_artifact, ConversionConfig, ConversionProgressCallback, PageError,
    ProgressCallback, ProgressSnapshot, RemovalBackend, RunState, SlideLayout,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the PDF is rasterized, then a
/// page bar with one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    /// Set by `on_page_error`, consumed by the following `on_page_complete`.
    last_failed: AtomicBool,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            last_failed: AtomicBool::new(false),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Cleaning");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_state_change(&self, state: RunState) {
        match state {
            RunState::Extracting => self.bar.set_message("Rasterizing pages…"),
            RunState::Idle => self.bar.finish_and_clear(),
            RunState::Processing | RunState::Completed => {}
        }
    }

    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Cleaning {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, index: usize, _total: usize, _progress_percent: f64) {
        if let Ok(mut t) = self.page_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_message(format!("page {}", index + 1));
    }

    fn on_page_error(&self, index: usize, total: usize, error: &PageError) {
        self.last_failed.store(true, Ordering::SeqCst);

        let error = error.to_string();
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
            dim(&format!("{:.1}s", self.page_elapsed())),
        ));
    }

    fn on_page_complete(&self, snapshot: &ProgressSnapshot) {
        if !self.last_failed.swap(false, Ordering::SeqCst) {
            let img = &snapshot.most_recent_original;
            self.bar.println(format!(
                "  {} Page {:>3}/{:<3}  {:<12}  {}",
                green("✓"),
                snapshot.processed_count,
                snapshot.total_pages,
                dim(&format!("{}x{}", img.width(), img.height())),
                dim(&format!("{:.1}s", self.page_elapsed())),
            ));
        }
        self.bar.set_position(snapshot.processed_count as u64);
    }

    fn on_conversion_complete(&self, total_pages: usize, cleaned_count: usize) {
        let failed = total_pages.saturating_sub(cleaned_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} pages cleaned",
                green("✔"),
                bold(&cleaned_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages cleaned  ({} kept their original image)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&cleaned_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes Cleaned_Presentation.pptx next to the PDF)
  pdf2pptx deck.pdf

  # Choose the output file
  pdf2pptx deck.pdf -o talk.pptx

  # Sharper pages, 4:3 slides
  pdf2pptx --dpi 200 --layout 4x3 deck.pdf

  # Larger watermark box (fractions of page width / height)
  pdf2pptx --width-fraction 0.2 --height-fraction 0.05 deck.pdf

  # Let Gemini repaint the corner instead of smearing it
  pdf2pptx --backend gemini deck.pdf

  # Inspect PDF metadata only
  pdf2pptx --inspect-only deck.pdf

  # Machine-readable per-page report
  pdf2pptx --json deck.pdf > report.json

BACKENDS:
  smear   (default) stretch the pixel row just above the box over it.
          Instant and offline; best on flat or vertically uniform corners.
  gemini  send each page to an image-editing model. Slow, needs an API key,
          copes with textured backgrounds.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY      Gemini API key (fallback: GOOGLE_API_KEY)
  PDFIUM_LIB_PATH     Path to libpdfium (file or directory)
  PDF2PPTX_*          Any flag, e.g. PDF2PPTX_DPI=200
  RUST_LOG            Override log filtering
"#;

/// Convert PDF slide decks to PowerPoint, erasing the corner watermark.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2pptx",
    version,
    about = "Convert PDF slide decks to PowerPoint, erasing the corner watermark",
    long_about = "Rasterize every page of a PDF deck, erase the watermark in the bottom-right \
corner of each page, and assemble the cleaned pages into a .pptx with one full-slide picture \
per page. Pages that cannot be cleaned keep their original image.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path.
    input: PathBuf,

    /// Write the presentation here (default: Cleaned_Presentation.pptx next to the input).
    #[arg(short, long, env = "PDF2PPTX_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI (72–400).
    #[arg(long, env = "PDF2PPTX_DPI", default_value_t = 144,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Maximum rendered pixels on either edge.
    #[arg(long, env = "PDF2PPTX_MAX_PIXELS", default_value_t = 4000)]
    max_pixels: u32,

    /// JPEG quality for rendered and cleaned pages (1–100).
    #[arg(long, env = "PDF2PPTX_QUALITY", default_value_t = 95,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Watermark box width as a fraction of page width.
    #[arg(long, env = "PDF2PPTX_WIDTH_FRACTION", default_value_t = 0.125)]
    width_fraction: f64,

    /// Watermark box height as a fraction of page height.
    #[arg(long, env = "PDF2PPTX_HEIGHT_FRACTION", default_value_t = 0.035)]
    height_fraction: f64,

    /// Removal backend.
    #[arg(long, env = "PDF2PPTX_BACKEND", value_enum, default_value = "smear")]
    backend: BackendArg,

    /// Gemini image model (gemini backend only).
    #[arg(long, env = "PDF2PPTX_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    model: String,

    /// Gemini API key (gemini backend only; default: GEMINI_API_KEY).
    #[arg(long, env = "PDF2PPTX_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2PPTX_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Slide shape of the output deck.
    #[arg(long, env = "PDF2PPTX_LAYOUT", value_enum, default_value = "16x9")]
    layout: LayoutArg,

    /// Per-page remote call timeout in seconds.
    #[arg(long, env = "PDF2PPTX_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Print a JSON report (stats + per-page summaries) to stdout.
    #[arg(long, env = "PDF2PPTX_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2PPTX_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2PPTX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2PPTX_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum BackendArg {
    Smear,
    Gemini,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LayoutArg {
    #[value(name = "16x9")]
    Wide,
    #[value(name = "4x3")]
    Standard,
}

impl From<LayoutArg> for SlideLayout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Wide => SlideLayout::Widescreen16x9,
            LayoutArg::Standard => SlideLayout::Standard4x3,
        }
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    output: String,
    stats: &'a edgequake_pdf2pptx::ConversionStats,
    metadata: Option<&'a edgequake_pdf2pptx::DocumentMetadata>,
    pages: Vec<edgequake_pdf2pptx::PageSummary>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar is the user-facing feedback; keep library logs at
    // error level while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input.display());
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.input, &config)
        .await
        .context("Conversion failed")?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, &config.output_file_name));
    write_artifact(&output.artifact, &output_path)
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    let stats = &output.stats;
    if cli.json {
        let report = JsonReport {
            output: output_path.display().to_string(),
            stats,
            metadata: output.metadata.as_ref(),
            pages: output.summaries(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Cleaned {}/{} pages in {}ms",
                stats.cleaned_pages, stats.total_pages, stats.total_duration_ms
            );
        }
        let failed = output.failed_indices();
        if !failed.is_empty() {
            let list: Vec<String> = failed.iter().map(|i| (i + 1).to_string()).collect();
            eprintln!("   {} {}", red("not cleaned:"), list.join(", "));
        }
        eprintln!(
            "{}  {} slides  {}ms  →  {}",
            if stats.failed_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.total_pages,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let backend = match cli.backend {
        BackendArg::Smear => RemovalBackend::Smear,
        BackendArg::Gemini => RemovalBackend::Gemini {
            model: cli.model.clone(),
            api_key: cli.api_key.clone(),
        },
    };

    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .jpeg_quality(cli.quality)
        .width_fraction(cli.width_fraction)
        .height_fraction(cli.height_fraction)
        .backend(backend)
        .slide_layout(cli.layout.clone().into())
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(name) = cli.output.as_ref().and_then(|p| p.file_name()) {
        builder = builder.output_file_name(name.to_string_lossy());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
