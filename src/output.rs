//! Data produced by a conversion run.
//!
//! Page images are encoded buffers behind an `Arc<[u8]>`. Cloning a
//! [`PageImage`] is cheap, which is what lets a failed page carry its
//! original as `cleaned` without copying the pixels.

use crate::error::{PageError, Pdf2PptxError};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

/// One rasterised page: an encoded image buffer plus its pixel size.
///
/// Immutable once created. Identity comes from the page's position in the
/// document, which lives on [`ProcessedPage::index`], not here.
#[derive(Clone, PartialEq, Eq)]
pub struct PageImage {
    data: Arc<[u8]>,
    width: u32,
    height: u32,
    format: ImageFormat,
}

impl PageImage {
    /// Wrap an already-encoded buffer whose dimensions are known.
    pub fn new(data: impl Into<Arc<[u8]>>, width: u32, height: u32, format: ImageFormat) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            format,
        }
    }

    /// Wrap an encoded buffer, sniffing its format and reading its header
    /// for the dimensions. The pixels themselves are not decoded.
    pub fn from_encoded(data: impl Into<Arc<[u8]>>) -> Result<Self, image::ImageError> {
        let data: Arc<[u8]> = data.into();
        let format = image::guess_format(&data)?;
        let (width, height) =
            image::ImageReader::with_format(Cursor::new(&data[..]), format).into_dimensions()?;
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type of the encoded buffer, e.g. `image/jpeg`.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    /// Preferred file extension, e.g. `jpg`.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    /// True when both handles point at the same buffer.
    pub fn shares_buffer(&self, other: &PageImage) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for PageImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Outcome of cleaning one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageStatus {
    /// The remover returned an image. This includes pages where the
    /// watermark region was deliberately left alone.
    Success,
    /// The remover failed; `cleaned` is the original image.
    Failed,
}

/// The result of processing one page.
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    /// 0-based position in the source document.
    pub index: usize,
    pub original: PageImage,
    /// Equal to `original` whenever `status` is [`PageStatus::Failed`].
    pub cleaned: PageImage,
    pub status: PageStatus,
    /// Why the page failed, if it did.
    pub error: Option<PageError>,
    /// Wall-clock time spent cleaning this page.
    pub duration_ms: u64,
}

impl ProcessedPage {
    pub fn success(index: usize, original: PageImage, cleaned: PageImage, duration_ms: u64) -> Self {
        Self {
            index,
            original,
            cleaned,
            status: PageStatus::Success,
            error: None,
            duration_ms,
        }
    }

    /// A page whose cleanup failed. `cleaned` shares the original buffer.
    pub fn failed(index: usize, original: PageImage, error: PageError, duration_ms: u64) -> Self {
        Self {
            index,
            cleaned: original.clone(),
            original,
            status: PageStatus::Failed,
            error: Some(error),
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == PageStatus::Success
    }

    /// The image that belongs on the slide: cleaned on success, else original.
    pub fn slide_image(&self) -> &PageImage {
        match self.status {
            PageStatus::Success => &self.cleaned,
            PageStatus::Failed => &self.original,
        }
    }

    pub fn summary(&self) -> PageSummary {
        PageSummary {
            index: self.index,
            status: self.status,
            width: self.original.width(),
            height: self.original.height(),
            cleaned_bytes: self.cleaned.data().len(),
            duration_ms: self.duration_ms,
            error: self.error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// Serialisable view of a [`ProcessedPage`] without the image buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSummary {
    pub index: usize,
    pub status: PageStatus,
    pub width: u32,
    pub height: u32,
    pub cleaned_bytes: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// PDF document metadata, extracted without rasterising any page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Timing and outcome counters for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages produced by the rasterizer.
    pub total_pages: usize,
    /// Pages whose status is `Success`.
    pub cleaned_pages: usize,
    /// Pages that fell back to their original image.
    pub failed_pages: usize,
    pub render_duration_ms: u64,
    pub cleanup_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// A finished presentation file held in memory.
#[derive(Clone)]
pub struct Artifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Everything a completed run produced.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// One entry per source page, indices `0..N` in order.
    pub pages: Vec<ProcessedPage>,
    /// Present when the input went through pdfium.
    pub metadata: Option<DocumentMetadata>,
    pub stats: ConversionStats,
    pub artifact: Artifact,
}

impl ConversionOutput {
    pub fn summaries(&self) -> Vec<PageSummary> {
        self.pages.iter().map(ProcessedPage::summary).collect()
    }

    /// Indices of pages that were not cleaned.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| !p.is_success())
            .map(|p| p.index)
            .collect()
    }

    /// Treat any failed page as an error.
    pub fn into_result(self) -> Result<Self, Pdf2PptxError> {
        if self.stats.failed_pages > 0 {
            return Err(Pdf2PptxError::PartialFailure {
                cleaned: self.stats.cleaned_pages,
                failed: self.stats.failed_pages,
                total: self.stats.total_pages,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::encode_jpeg;
    use image::{DynamicImage, Rgb, RgbImage};

    fn jpeg(w: u32, h: u32) -> PageImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 10, 10])));
        encode_jpeg(&img, 90).expect("encode")
    }

    #[test]
    fn from_encoded_reads_header() {
        let page = jpeg(31, 17);
        let sniffed = PageImage::from_encoded(page.data().to_vec()).expect("sniff");
        assert_eq!((sniffed.width(), sniffed.height()), (31, 17));
        assert_eq!(sniffed.format(), ImageFormat::Jpeg);
        assert_eq!(sniffed.mime_type(), "image/jpeg");
    }

    #[test]
    fn from_encoded_rejects_garbage() {
        assert!(PageImage::from_encoded(vec![0u8, 1, 2, 3, 4]).is_err());
    }

    #[test]
    fn failed_page_shares_original() {
        let original = jpeg(8, 8);
        let page = ProcessedPage::failed(
            3,
            original.clone(),
            PageError::Cleanup {
                page: 3,
                detail: "boom".into(),
            },
            1,
        );
        assert_eq!(page.status, PageStatus::Failed);
        assert_eq!(page.cleaned, page.original);
        assert!(page.cleaned.shares_buffer(&original));
        assert!(page.slide_image().shares_buffer(&original));
    }

    #[test]
    fn summary_serialises_without_buffers() {
        let page = ProcessedPage::success(0, jpeg(4, 2), jpeg(4, 2), 5);
        let json = serde_json::to_string(&page.summary()).unwrap();
        assert!(json.contains("\"status\":\"Success\""));
        assert!(!json.contains("error"));
    }

    #[test]
    fn into_result_flags_partial_failure() {
        let output = ConversionOutput {
            pages: vec![],
            metadata: None,
            stats: ConversionStats {
                total_pages: 3,
                cleaned_pages: 2,
                failed_pages: 1,
                ..Default::default()
            },
            artifact: Artifact {
                file_name: "x.pptx".into(),
                bytes: vec![],
            },
        };
        assert!(matches!(
            output.into_result(),
            Err(Pdf2PptxError::PartialFailure { failed: 1, .. })
        ));
    }
}
