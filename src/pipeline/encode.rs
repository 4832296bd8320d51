//! Image encoding: `DynamicImage` ⇄ encoded [`PageImage`] buffers.
//!
//! Pages travel through the pipeline as JPEG. Slide decks are mostly flat
//! colour and photos, where quality 95 is visually lossless at a fraction of
//! PNG's size, and the assembled `.pptx` embeds the buffers as-is.

use crate::output::PageImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use tracing::debug;

/// Encode an image as JPEG at `quality` (1–100).
///
/// JPEG has no alpha channel, so the image is flattened to RGB first.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<PageImage, image::ImageError> {
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    rgb.write_with_encoder(encoder)?;
    debug!(
        width = rgb.width(),
        height = rgb.height(),
        bytes = buf.len(),
        "Encoded page as JPEG"
    );
    Ok(PageImage::new(buf, rgb.width(), rgb.height(), ImageFormat::Jpeg))
}

/// Decode a page buffer back into pixels.
pub fn decode(page: &PageImage) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory_with_format(page.data(), page.format())
}

/// Base64-encode a page buffer for embedding in a JSON request body.
pub fn to_base64(page: &PageImage) -> String {
    STANDARD.encode(page.data())
}
