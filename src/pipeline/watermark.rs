//! Watermark removal: erase a fixed bottom-right box on every page.
//!
//! ## The smear
//!
//! The watermark always sits in the same corner, inside the slide's bottom
//! margin. Slide backgrounds there are flat or a smooth vertical gradient, so
//! the single pixel row just above the box is a good stand-in for everything
//! under it. [`SmearRemover`] samples that row and stretches it down over the
//! box:
//!
//! ```text
//!   ┌──────────────────────────────┐
//!   │                              │
//!   │            slide             │
//!   │                   ┌ y-1 ─────┤  ← sampled row
//!   │                   │▓▓ mark ▓▓│  ← overwritten with that row
//!   └───────────────────┴──────────┘
//! ```
//!
//! No detection, constant time per page. The box is a guess rather than a
//! detected bounding box, so every failure path hands back the original page:
//! a visible watermark beats damaged slide content.
//!
//! Running the remover twice on the same page is not a no-op. The second pass
//! re-samples a row that JPEG has already perturbed, so pixels in the box may
//! drift slightly.

use crate::config::{ConversionConfig, RemovalBackend};
use crate::error::{Pdf2PptxError, RemovalError};
use crate::output::PageImage;
use crate::pipeline::encode;
use crate::pipeline::remote::GeminiRemover;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use std::sync::Arc;
use tracing::{debug, warn};

/// The bottom-right box targeted for removal on one image.
///
/// Always anchored so `x + width == image width` and
/// `y + height == image height`. Recomputed for every page because page
/// sizes can differ within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl WatermarkRegion {
    /// Box covering `floor(w * width_fraction)` × `floor(h * height_fraction)`
    /// pixels in the bottom-right corner of a `w` × `h` image.
    pub fn for_image(
        image_width: u32,
        image_height: u32,
        width_fraction: f64,
        height_fraction: f64,
    ) -> Self {
        let width = scaled(image_width, width_fraction);
        let height = scaled(image_height, height_fraction);
        Self {
            x: image_width - width,
            y: image_height - height,
            width,
            height,
        }
    }

    /// True when the box covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True when there is room above the box to take a clean sample row.
    ///
    /// The top edge must sit more than one pixel below the top of the image.
    pub fn has_sampling_margin(&self) -> bool {
        self.y > 1
    }
}

fn scaled(extent: u32, fraction: f64) -> u32 {
    let v = (f64::from(extent) * fraction).floor();
    if v.is_finite() && v > 0.0 {
        (v as u32).min(extent)
    } else {
        0
    }
}

/// The `remove(image) -> image` capability.
///
/// Implementations run on a blocking thread and may take as long as they
/// need. An `Err` is not fatal: the orchestrator records the page as failed
/// and puts the original on the slide.
pub trait WatermarkRemover: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Return a cleaned copy of `page` with the same width and height.
    fn remove(&self, page: &PageImage) -> Result<PageImage, RemovalError>;
}

/// Local, deterministic watermark remover. See the module docs.
#[derive(Debug, Clone)]
pub struct SmearRemover {
    width_fraction: f64,
    height_fraction: f64,
    jpeg_quality: u8,
}

impl Default for SmearRemover {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_WIDTH_FRACTION,
            crate::config::DEFAULT_HEIGHT_FRACTION,
            95,
        )
    }
}

impl SmearRemover {
    pub fn new(width_fraction: f64, height_fraction: f64, jpeg_quality: u8) -> Self {
        Self {
            width_fraction,
            height_fraction,
            jpeg_quality,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.width_fraction, config.height_fraction, config.jpeg_quality)
    }

    pub fn region_for(&self, page: &PageImage) -> WatermarkRegion {
        WatermarkRegion::for_image(
            page.width(),
            page.height(),
            self.width_fraction,
            self.height_fraction,
        )
    }

    /// Clean one page. Never fails: any problem yields `page` unchanged.
    pub fn clean(&self, page: &PageImage) -> PageImage {
        let region = self.region_for(page);

        if region.is_empty() {
            debug!(
                width = page.width(),
                height = page.height(),
                "Watermark box is empty at this page size; leaving page as-is"
            );
            return page.clone();
        }
        if !region.has_sampling_margin() {
            warn!(
                y = region.y,
                height = page.height(),
                "No room above watermark box to sample; leaving page as-is"
            );
            return page.clone();
        }

        match self.smear(page, &region) {
            Ok(cleaned) => cleaned,
            Err(e) => {
                warn!("Smear failed, keeping original page: {}", e);
                page.clone()
            }
        }
    }

    fn smear(&self, page: &PageImage, region: &WatermarkRegion) -> Result<PageImage, RemovalError> {
        let decoded = encode::decode(page)?;
        if (decoded.width(), decoded.height()) != (page.width(), page.height()) {
            return Err(RemovalError::Cleanup(format!(
                "decoded size {}x{} does not match header {}x{}",
                decoded.width(),
                decoded.height(),
                page.width(),
                page.height()
            )));
        }

        let mut rgb = decoded.into_rgb8();
        smear_region(&mut rgb, region);
        debug!(
            x = region.x,
            y = region.y,
            w = region.width,
            h = region.height,
            "Smeared watermark box"
        );

        Ok(encode::encode_jpeg(&DynamicImage::ImageRgb8(rgb), self.jpeg_quality)?)
    }
}

impl WatermarkRemover for SmearRemover {
    fn name(&self) -> &str {
        "smear"
    }

    fn remove(&self, page: &PageImage) -> Result<PageImage, RemovalError> {
        Ok(self.clean(page))
    }
}

/// Overwrite `region` with the one-pixel row directly above it, stretched
/// to the region's height.
///
/// Leaves `img` alone when the region is empty, starts on the top row, or
/// does not fit inside the image.
pub(crate) fn smear_region(img: &mut RgbImage, region: &WatermarkRegion) {
    let fits = u64::from(region.x) + u64::from(region.width) <= u64::from(img.width())
        && u64::from(region.y) + u64::from(region.height) <= u64::from(img.height());
    if region.is_empty() || region.y == 0 || !fits {
        return;
    }
    let strip = imageops::crop_imm(&*img, region.x, region.y - 1, region.width, 1).to_image();
    let filled = imageops::resize(&strip, region.width, region.height, FilterType::Nearest);
    imageops::replace(img, &filled, i64::from(region.x), i64::from(region.y));
}

/// Build the remover selected by `config.backend`.
pub fn remover_from_config(
    config: &ConversionConfig,
) -> Result<Arc<dyn WatermarkRemover>, Pdf2PptxError> {
    match &config.backend {
        RemovalBackend::Smear => Ok(Arc::new(SmearRemover::from_config(config))),
        RemovalBackend::Gemini { model, api_key } => Ok(Arc::new(GeminiRemover::new(
            model.clone(),
            api_key.clone(),
            config.api_timeout_secs,
            config.jpeg_quality,
        )?)),
    }
}
