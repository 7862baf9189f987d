//! Direct OCR path: provider client, response types and paper helpers.
//!
//! This path skips the extraction backend and renders the provider's raw
//! markdown, so it has no highlights or resources.

mod client;
pub mod paper;

pub use client::{OcrClient, OcrConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the OCR provider.
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR API key is not configured (set MISTRAL_API_KEY)")]
    MissingApiKey,
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("OCR returned no pages")]
    EmptyResponse,
}

impl From<OcrError> for crate::error::Error {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::MissingApiKey => crate::error::Error::Config(e.to_string()),
            other => crate::error::Error::RemoteExtraction(other.to_string()),
        }
    }
}

/// An image cut out of a page, with its bounding box in page pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrImage {
    pub id: String,
    #[serde(default)]
    pub top_left_x: u32,
    #[serde(default)]
    pub top_left_y: u32,
    #[serde(default)]
    pub bottom_right_x: u32,
    #[serde(default)]
    pub bottom_right_y: u32,
    /// Raw base64 or a full data URI.
    #[serde(default)]
    pub image_base64: Option<String>,
}

impl OcrImage {
    pub fn width(&self) -> u32 {
        self.bottom_right_x.saturating_sub(self.top_left_x)
    }

    pub fn height(&self) -> u32 {
        self.bottom_right_y.saturating_sub(self.top_left_y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDimensions {
    pub dpi: u32,
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    /// 0-based.
    pub index: u32,
    pub markdown: String,
    #[serde(default)]
    pub images: Vec<OcrImage>,
    #[serde(default)]
    pub dimensions: Option<PageDimensions>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageInfo {
    pub pages_processed: u32,
    #[serde(default)]
    pub doc_size_bytes: Option<u64>,
}

/// Full OCR response for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrDocument {
    pub pages: Vec<OcrPage>,
    pub model: String,
    #[serde(default)]
    pub usage_info: UsageInfo,
}

impl OcrDocument {
    /// Page by 1-based number.
    pub fn page(&self, number: u32) -> Option<&OcrPage> {
        let index = number.checked_sub(1)?;
        self.pages.iter().find(|p| p.index == index)
    }
}
