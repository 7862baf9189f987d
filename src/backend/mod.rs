//! Backend API client: page extraction and PDF download.

mod http_client;
pub mod wire;

pub use http_client::{resolve_user_agent, HttpClient, HttpResponse};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{Error, Result, GENERIC_EXTRACTION_FAILURE};
use crate::models::ExtractionPayload;
use wire::{remote_error, DownloadRequest, DownloadResponse, ExtractRequest, ExtractResponse};

/// Operations the session core needs from the backend.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Fetch page `page_number` (1-based) of the document at `url`.
    async fn extract_page(&self, url: &str, page_number: u32) -> Result<ExtractionPayload>;

    /// Ask the backend to fetch a PDF; returns the URL it reports for the copy.
    async fn download_pdf(&self, pdf_url: &str) -> Result<String>;
}

/// [`BackendApi`] over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    http: HttpClient,
    base_url: String,
}

impl HttpBackend {
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: serde::Serialize + Sync>(&self, path: &str, body: &B) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.post_json(&url, body).await.map_err(|e| {
            warn!("Request to {} failed: {}", url, e);
            Error::RemoteExtraction(GENERIC_EXTRACTION_FAILURE.to_string())
        })?;

        let success = response.is_success();
        let status = response.status;
        let body = response.text().await.map_err(|e| {
            warn!("Failed to read response from {}: {}", url, e);
            Error::RemoteExtraction(GENERIC_EXTRACTION_FAILURE.to_string())
        })?;

        if !success {
            warn!("{} returned HTTP {}", url, status);
            return Err(remote_error(&body));
        }

        Ok(body)
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn extract_page(&self, url: &str, page_number: u32) -> Result<ExtractionPayload> {
        info!("Extracting page {} of {}", page_number, url);
        let body = self
            .post("/api/extract", &ExtractRequest { url, page_number })
            .await?;

        let response: ExtractResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Malformed extraction response: {}", e);
            Error::RemoteExtraction(GENERIC_EXTRACTION_FAILURE.to_string())
        })?;

        response.into_payload(page_number)
    }

    async fn download_pdf(&self, pdf_url: &str) -> Result<String> {
        info!("Requesting download of {}", pdf_url);
        let body = self
            .post("/pdf/download", &DownloadRequest { pdf_url })
            .await?;

        let response: DownloadResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Malformed download response: {}", e);
            Error::RemoteExtraction("Failed to download PDF".to_string())
        })?;

        match (response.status.as_str(), response.data) {
            ("success", Some(data)) => Ok(data.pdf_url),
            _ => Err(Error::RemoteExtraction(
                response
                    .message
                    .unwrap_or_else(|| "Failed to download PDF".to_string()),
            )),
        }
    }
}
