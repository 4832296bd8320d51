//! Configuration types for PDF-to-PowerPoint conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct holds every knob so a run
//! can be logged, cloned onto a blocking thread, or diffed against another.

use crate::error::Pdf2PptxError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default watermark box width as a fraction of the page width.
pub const DEFAULT_WIDTH_FRACTION: f64 = 0.125;

/// Default watermark box height as a fraction of the page height.
pub const DEFAULT_HEIGHT_FRACTION: f64 = 0.035;

/// File name given to the assembled deck when the caller does not pick one.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "Cleaned_Presentation.pptx";

/// Configuration for a PDF-to-PowerPoint conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2pptx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(200)
///     .jpeg_quality(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI used when rasterising each PDF page. Range: 72–400. Default: 144.
    ///
    /// 144 DPI is twice the PDF's native 72 points per inch, sharp enough
    /// that slide text survives a full-screen projection.
    pub dpi: u32,

    /// Maximum rendered image dimension (width or height) in pixels. Default: 4000.
    ///
    /// Caps memory on oversized pages independently of DPI.
    pub max_rendered_pixels: u32,

    /// JPEG quality for rasterised and cleaned pages, 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// Watermark box width as a fraction of the page width. Default: 0.125.
    ///
    /// Together with `height_fraction` this is the most sensitive setting:
    /// too large and the smear tears into slide content, too small and the
    /// watermark's edges survive.
    pub width_fraction: f64,

    /// Watermark box height as a fraction of the page height. Default: 0.035.
    pub height_fraction: f64,

    /// Which watermark removal implementation to run. Default: [`RemovalBackend::Smear`].
    pub backend: RemovalBackend,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Slide canvas shape. Default: [`SlideLayout::Widescreen16x9`].
    pub slide_layout: SlideLayout,

    /// Name given to the assembled deck. Default: `Cleaned_Presentation.pptx`.
    pub output_file_name: String,

    /// Per-page timeout for the remote backend in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Optional per-page progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 144,
            max_rendered_pixels: 4000,
            jpeg_quality: 95,
            width_fraction: DEFAULT_WIDTH_FRACTION,
            height_fraction: DEFAULT_HEIGHT_FRACTION,
            backend: RemovalBackend::default(),
            password: None,
            slide_layout: SlideLayout::default(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_string(),
            api_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("width_fraction", &self.width_fraction)
            .field("height_fraction", &self.height_fraction)
            .field("backend", &self.backend)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("slide_layout", &self.slide_layout)
            .field("output_file_name", &self.output_file_name)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    /// Set the watermark box width fraction. Validated by [`Self::build`].
    pub fn width_fraction(mut self, f: f64) -> Self {
        self.config.width_fraction = f;
        self
    }

    /// Set the watermark box height fraction. Validated by [`Self::build`].
    pub fn height_fraction(mut self, f: f64) -> Self {
        self.config.height_fraction = f;
        self
    }

    pub fn backend(mut self, backend: RemovalBackend) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn slide_layout(mut self, layout: SlideLayout) -> Self {
        self.config.slide_layout = layout;
        self
    }

    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_file_name = name.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2PptxError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2PptxError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        for (name, f) in [
            ("width_fraction", c.width_fraction),
            ("height_fraction", c.height_fraction),
        ] {
            if !(f > 0.0 && f < 1.0) {
                return Err(Pdf2PptxError::InvalidConfig(format!(
                    "{name} must be in (0, 1), got {f}"
                )));
            }
        }
        if c.output_file_name.trim().is_empty() {
            return Err(Pdf2PptxError::InvalidConfig(
                "Output file name must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Watermark removal implementation.
///
/// Both variants satisfy the same `remove(image) -> image` contract
/// ([`crate::pipeline::watermark::WatermarkRemover`]); the orchestrator never
/// knows which one it is driving.
#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum RemovalBackend {
    /// Local, deterministic smear over the bottom-right corner. (default)
    #[default]
    Smear,
    /// Remote image-editing model. `api_key` falls back to `GEMINI_API_KEY`
    /// then `GOOGLE_API_KEY` when `None`.
    Gemini {
        model: String,
        api_key: Option<String>,
    },
}

impl fmt::Debug for RemovalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalBackend::Smear => f.write_str("Smear"),
            RemovalBackend::Gemini { model, api_key } => f
                .debug_struct("Gemini")
                .field("model", model)
                .field("api_key", &api_key.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Slide canvas shape of the assembled deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlideLayout {
    /// 10 × 5.625 in. (default)
    #[default]
    Widescreen16x9,
    /// 10 × 7.5 in.
    Standard4x3,
}

impl SlideLayout {
    /// Canvas size in EMU (914 400 per inch).
    pub fn size_emu(self) -> (u64, u64) {
        match self {
            SlideLayout::Widescreen16x9 => (9_144_000, 5_143_500),
            SlideLayout::Standard4x3 => (9_144_000, 6_858_000),
        }
    }

    /// The `type` attribute PowerPoint expects on `<p:sldSz>`.
    pub fn ooxml_type(self) -> &'static str {
        match self {
            SlideLayout::Widescreen16x9 => "screen16x9",
            SlideLayout::Standard4x3 => "screen4x3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ConversionConfig::default();
        assert_eq!(c.dpi, 144);
        assert_eq!(c.jpeg_quality, 95);
        assert_eq!(c.width_fraction, 0.125);
        assert_eq!(c.height_fraction, 0.035);
        assert_eq!(c.backend, RemovalBackend::Smear);
        assert_eq!(c.output_file_name, "Cleaned_Presentation.pptx");
    }

    #[test]
    fn builder_clamps_numeric_knobs() {
        let c = ConversionConfig::builder()
            .dpi(10)
            .jpeg_quality(0)
            .max_rendered_pixels(5)
            .build()
            .unwrap();
        assert_eq!(c.dpi, 72);
        assert_eq!(c.jpeg_quality, 1);
        assert_eq!(c.max_rendered_pixels, 100);
    }

    #[test]
    fn builder_rejects_out_of_range_fractions() {
        assert!(ConversionConfig::builder().width_fraction(0.0).build().is_err());
        assert!(ConversionConfig::builder().height_fraction(1.0).build().is_err());
        assert!(ConversionConfig::builder()
            .width_fraction(f64::NAN)
            .build()
            .is_err());
    }

    #[test]
    fn builder_rejects_blank_output_name() {
        assert!(ConversionConfig::builder()
            .output_file_name("  ")
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = ConversionConfig::builder()
            .password("hunter2")
            .backend(RemovalBackend::Gemini {
                model: "m".into(),
                api_key: Some("sk-secret".into()),
            })
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("sk-secret"));
    }

    #[test]
    fn slide_layouts_share_width() {
        assert_eq!(SlideLayout::Widescreen16x9.size_emu().0, SlideLayout::Standard4x3.size_emu().0);
        assert_eq!(SlideLayout::Standard4x3.ooxml_type(), "screen4x3");
    }
}
