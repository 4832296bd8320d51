//! Remote watermark removal through Gemini's image-editing models.
//!
//! Sends the page plus a fixed editing instruction to the `generateContent`
//! REST endpoint and takes the first inline image of the reply. Slower and
//! non-deterministic compared with [`super::watermark::SmearRemover`], but it
//! can repaint textured backgrounds the smear cannot.
//!
//! The request runs on the orchestrator's blocking thread, so the blocking
//! `reqwest` client is the right tool here. The client is built on first use
//! for the same reason: it must not be created inside an async context.

use crate::error::{Pdf2PptxError, RemovalError};
use crate::output::PageImage;
use crate::pipeline::encode;
use crate::pipeline::watermark::WatermarkRemover;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info};

/// Default image-editing model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-image-preview";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

const EDIT_PROMPT: &str = "Remove the text and logo watermark from the bottom right corner of \
this slide. Fill the area with the background color or pattern so it looks seamless. Do not \
alter any other text or graphics on the slide.";

/// [`WatermarkRemover`] backed by the Gemini API.
pub struct GeminiRemover {
    client: OnceLock<reqwest::blocking::Client>,
    timeout: Duration,
    endpoint: String,
    api_key: String,
    model: String,
    jpeg_quality: u8,
}

impl std::fmt::Debug for GeminiRemover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiRemover")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiRemover {
    /// Create a remover for `model`. Without an explicit key, reads
    /// `GEMINI_API_KEY` and then `GOOGLE_API_KEY`.
    pub fn new(
        model: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
        jpeg_quality: u8,
    ) -> Result<Self, Pdf2PptxError> {
        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| env_key("GEMINI_API_KEY"))
            .or_else(|| env_key("GOOGLE_API_KEY"))
            .ok_or_else(|| {
                Pdf2PptxError::InvalidConfig(
                    "Gemini backend needs an API key.\n\
                     Set GEMINI_API_KEY or pass --api-key."
                        .into(),
                )
            })?;

        let model = model.into();
        info!("Using Gemini watermark removal with model {}", model);
        Ok(Self {
            client: OnceLock::new(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
            endpoint: API_BASE.to_string(),
            api_key,
            model,
            jpeg_quality,
        })
    }

    /// Point the remover at a different API base (proxies, tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn client(&self) -> Result<&reqwest::blocking::Client, RemovalError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| RemovalError::Resource(format!("HTTP client: {e}")))?;
        Ok(self.client.get_or_init(|| client))
    }

    fn request_body(page: &PageImage) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(EDIT_PROMPT.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: page.mime_type().to_string(),
                            data: encode::to_base64(page),
                        }),
                    },
                ],
            }],
        }
    }

    /// Decode the reply image and bring it back to the source page's size.
    fn normalise(&self, reply: Vec<u8>, page: &PageImage) -> Result<PageImage, RemovalError> {
        let reply = PageImage::from_encoded(reply)?;
        if reply.format() == image::ImageFormat::Jpeg
            && (reply.width(), reply.height()) == (page.width(), page.height())
        {
            return Ok(reply);
        }
        let img = encode::decode(&reply)?;
        let img = if (img.width(), img.height()) == (page.width(), page.height()) {
            img
        } else {
            debug!(
                from_w = img.width(),
                from_h = img.height(),
                to_w = page.width(),
                to_h = page.height(),
                "Resizing remote result to source page size"
            );
            img.resize_exact(page.width(), page.height(), FilterType::Lanczos3)
        };
        Ok(encode::encode_jpeg(&img, self.jpeg_quality)?)
    }
}

impl WatermarkRemover for GeminiRemover {
    fn name(&self) -> &str {
        "gemini"
    }

    fn remove(&self, page: &PageImage) -> Result<PageImage, RemovalError> {
        let url = format!("{}/{}:generateContent", self.endpoint, self.model);
        let response = self
            .client()?
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(page))
            .send()
            .map_err(|e| RemovalError::Remote(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(RemovalError::Remote(format!(
                "HTTP {status}: {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        let reply: GenerateResponse = response
            .json()
            .map_err(|e| RemovalError::Remote(format!("invalid response: {e}")))?;
        let data = first_inline_image(&reply)
            .ok_or_else(|| RemovalError::Remote("no image generated in response".into()))?;
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| RemovalError::Remote(format!("invalid base64 image: {e}")))?;

        self.normalise(bytes, page)
    }
}

fn env_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn first_inline_image(reply: &GenerateResponse) -> Option<&str> {
    reply
        .candidates
        .iter()
        .flat_map(|c| c.content.iter())
        .flat_map(|c| c.parts.iter())
        .find_map(|p| p.inline_data.as_ref())
        .map(|d| d.data.as_str())
        .filter(|d| !d.is_empty())
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}
