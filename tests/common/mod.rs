//! Scripted backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use smartread::backend::BackendApi;
use smartread::models::{ExtractionPayload, HighlightResources, PageImage, Resource, VideoResources};
use smartread::{Error, Result};

/// In-process [`BackendApi`] with scripted failures and an optional gate that
/// holds requests for one URL until released.
#[derive(Default)]
pub struct FakeBackend {
    pub total_pages: u32,
    calls: Mutex<Vec<(String, u32)>>,
    failing_urls: HashSet<String>,
    failing_pages: HashSet<u32>,
    gated_url: Option<String>,
    /// Signalled when a gated request has arrived.
    pub entered: Arc<Notify>,
    /// Signal to let a gated request proceed.
    pub release: Arc<Notify>,
}

impl FakeBackend {
    pub fn new(total_pages: u32) -> Self {
        Self {
            total_pages,
            ..Default::default()
        }
    }

    pub fn failing_url(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    pub fn gated(mut self, url: &str) -> Self {
        self.gated_url = Some(url.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn page_payload(page: u32, total_pages: u32) -> ExtractionPayload {
    let mut resources = BTreeMap::new();
    resources.insert(
        "0".to_string(),
        HighlightResources {
            articles: vec![Resource {
                title: format!("Background for page {page}"),
                link: format!("https://example.com/articles/{page}"),
                snippet: Some("An explainer.".to_string()),
                image_url: None,
                duration: None,
            }],
            videos: VideoResources::default(),
        },
    );

    ExtractionPayload {
        total_pages,
        // The real backend reports a 0-based index; the client must not rely on it.
        current_page: page.saturating_sub(1),
        page_content: format!(
            r#"<h2>Page {page}</h2><p><highlight index="0">term {page}</highlight> $x_{page}$</p><img src="img-{page}.jpeg">"#
        ),
        images: vec![PageImage {
            id: format!("img-{page}.jpeg"),
            url: format!("https://cdn.example.com/img-{page}.jpeg"),
        }],
        resources,
        is_page_change_result: false,
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn extract_page(&self, url: &str, page_number: u32) -> Result<ExtractionPayload> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), page_number));

        if self.gated_url.as_deref() == Some(url) {
            self.entered.notify_one();
            self.release.notified().await;
        }

        if self.failing_urls.contains(url) {
            return Err(Error::RemoteExtraction(
                "Unable to fetch document from URL".to_string(),
            ));
        }
        if self.failing_pages.contains(&page_number) {
            return Err(Error::RemoteExtraction("Page fetch failed".to_string()));
        }

        Ok(page_payload(page_number, self.total_pages))
    }

    async fn download_pdf(&self, pdf_url: &str) -> Result<String> {
        let name = pdf_url.rsplit('/').next().unwrap_or("paper.pdf");
        Ok(format!("https://cdn.example.com/pdfs/{name}"))
    }
}
