//! Request and response bodies of the backend API, and their normalisation
//! into [`ExtractionPayload`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result, GENERIC_EXTRACTION_FAILURE};
use crate::models::{ExtractionPayload, HighlightResources, PageImage, Resource, VideoResources};

#[derive(Debug, Serialize)]
pub struct ExtractRequest<'a> {
    pub url: &'a str,
    pub page_number: u32,
}

#[derive(Debug, Deserialize)]
pub struct ExtractResponse {
    pub data: ExtractData,
}

#[derive(Debug, Deserialize)]
pub struct ExtractData {
    #[serde(default)]
    pub total_pages: Option<u32>,
    pub page: WirePage,
}

#[derive(Debug, Deserialize)]
pub struct WirePage {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Option<Vec<WireImage>>,
    #[serde(default)]
    pub resources: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct WireImage {
    pub id: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Error body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable message, when the service sent a plain string detail.
    pub fn message(&self) -> Option<&str> {
        match &self.detail {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Map a failed response body to a `RemoteExtraction` error.
pub fn remote_error(body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message().map(str::to_string))
        .unwrap_or_else(|| GENERIC_EXTRACTION_FAILURE.to_string());
    Error::RemoteExtraction(message)
}

#[derive(Debug, Serialize)]
pub struct DownloadRequest<'a> {
    pub pdf_url: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct DownloadResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<DownloadData>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadData {
    pub pdf_url: String,
}

impl ExtractResponse {
    /// Normalise into a payload for `requested_page`.
    ///
    /// The page index echoed by the backend is not trusted; the page that was
    /// asked for is the page that was returned.
    pub fn into_payload(self, requested_page: u32) -> Result<ExtractionPayload> {
        let total_pages = match self.data.total_pages {
            Some(n) if n >= 1 => n,
            other => {
                warn!("Extraction response has invalid total_pages: {:?}", other);
                return Err(Error::RemoteExtraction(
                    GENERIC_EXTRACTION_FAILURE.to_string(),
                ));
            }
        };

        if requested_page > total_pages {
            warn!(
                "Backend returned page {} of a {}-page document",
                requested_page, total_pages
            );
            return Err(Error::RemoteExtraction(format!(
                "Page {} is out of range (document has {} pages)",
                requested_page, total_pages
            )));
        }

        let page = self.data.page;

        let images = page
            .images
            .unwrap_or_default()
            .into_iter()
            .filter_map(|img| match img.image_url {
                Some(url) if !url.is_empty() => Some(PageImage { id: img.id, url }),
                _ => None,
            })
            .collect();

        let resources = page
            .resources
            .unwrap_or_default()
            .into_iter()
            .map(|(index, value)| {
                let parsed = highlight_resources(&index, value);
                (index, parsed)
            })
            .collect();

        Ok(ExtractionPayload {
            total_pages,
            current_page: requested_page,
            page_content: page.content,
            images,
            resources,
            is_page_change_result: false,
        })
    }
}

/// Resources of one highlight. Malformed entries are dropped one at a
/// time; the rest of their list survives.
fn highlight_resources(index: &str, value: serde_json::Value) -> HighlightResources {
    let serde_json::Value::Object(mut fields) = value else {
        warn!("Ignoring malformed resources for highlight {}", index);
        return HighlightResources::default();
    };

    let articles = match fields.remove("articles") {
        Some(serde_json::Value::Array(items)) => resource_list(index, "article", items),
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(other) => {
            warn!("Ignoring non-list articles for highlight {}: {}", index, other);
            Vec::new()
        }
    };

    let videos = match fields.remove("videos") {
        Some(serde_json::Value::Array(items)) => {
            VideoResources::List(resource_list(index, "video", items))
        }
        None | Some(serde_json::Value::Null) => VideoResources::default(),
        Some(other) => VideoResources::Unrecognized(other),
    };

    HighlightResources { articles, videos }
}

fn resource_list(index: &str, kind: &str, items: Vec<serde_json::Value>) -> Vec<Resource> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Resource>(item) {
            Ok(resource) => Some(resource),
            Err(e) => {
                warn!("Skipping malformed {} for highlight {}: {}", kind, index, e);
                None
            }
        })
        .collect()
}
