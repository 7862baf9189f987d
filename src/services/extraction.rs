//! Extraction client: the document session and the only writer of the cache.
//!
//! Every request is tagged with the session generation it was issued under.
//! A reset or a newer extraction bumps the generation, and results carrying an
//! old tag are dropped before they can touch session state or the cache.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::backend::BackendApi;
use crate::error::{Error, Result};
use crate::models::{CacheEntry, ExtractionPayload};
use crate::repository::DocumentCache;

/// Result of [`ExtractionClient::change_page`].
#[derive(Debug, Clone, PartialEq)]
pub enum PageChange {
    /// Same page or out of range; no request was made.
    Unchanged,
    /// The page was fetched, merged into the session and cached.
    Loaded(ExtractionPayload),
    /// The session moved on while the request was in flight.
    Discarded,
}

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    /// Bumped per page request; only the latest one may land.
    page_request: u64,
    active_url: Option<String>,
    payload: Option<ExtractionPayload>,
    loading: bool,
    last_error: Option<String>,
}

impl SessionState {
    fn clear(&mut self) {
        self.generation += 1;
        self.active_url = None;
        self.payload = None;
        self.loading = false;
        self.last_error = None;
    }
}

/// Validate user input as an absolute URL with a scheme and host.
pub fn validate_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Please enter a URL".to_string()));
    }

    let parsed = Url::parse(trimmed)
        .map_err(|e| Error::InvalidInput(format!("'{}' is not a valid URL: {}", trimmed, e)))?;
    if parsed.cannot_be_a_base() || parsed.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidInput(format!(
            "'{}' is not a valid URL: missing host",
            trimmed
        )));
    }

    Ok(trimmed.to_string())
}

pub struct ExtractionClient {
    api: Arc<dyn BackendApi>,
    cache: DocumentCache,
    state: Mutex<SessionState>,
}

impl ExtractionClient {
    /// Client with an empty session.
    pub fn new(api: Arc<dyn BackendApi>, cache: DocumentCache) -> Self {
        Self {
            api,
            cache,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Client rehydrated from whatever the cache holds.
    pub async fn restore(api: Arc<dyn BackendApi>, cache: DocumentCache) -> Result<Self> {
        let client = Self::new(api, cache);
        if let Some(entry) = client.cache.read().await? {
            info!(
                "Restored {} at page {}/{}",
                entry.source_url, entry.payload.current_page, entry.payload.total_pages
            );
            // A page change interrupted by exit leaves the last page ahead
            // of the cached payload; the payload wins.
            let displayed = entry.payload.current_page;
            if client.cache.last_page().await? != Some(displayed) {
                debug!("Resetting last viewed page to {}", displayed);
                client.cache.set_last_page(displayed).await?;
            }
            let mut state = client.state.lock().await;
            state.active_url = Some(entry.source_url);
            state.payload = Some(entry.payload);
        }
        Ok(client)
    }

    pub fn cache(&self) -> &DocumentCache {
        &self.cache
    }

    pub async fn active_url(&self) -> Option<String> {
        self.state.lock().await.active_url.clone()
    }

    pub async fn current(&self) -> Option<ExtractionPayload> {
        self.state.lock().await.payload.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.lock().await.loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    /// Start a new session on `url` and fetch its first page.
    pub async fn extract(&self, url: &str) -> Result<ExtractionPayload> {
        let url = validate_url(url)?;

        let generation = {
            let mut state = self.state.lock().await;
            state.clear();
            state.loading = true;
            if let Err(e) = self.cache.clear().await {
                state.loading = false;
                return Err(e);
            }
            state.generation
        };

        info!("Extracting {}", url);
        let result = self.api.extract_page(&url, 1).await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("Dropping extraction of {}: session moved on", url);
            return Err(Error::Superseded);
        }
        state.loading = false;

        match result {
            Ok(mut payload) => {
                payload.current_page = 1;
                payload.is_page_change_result = false;

                let entry = CacheEntry::new(url.clone(), payload.clone());
                if let Err(e) = self.cache.write(&entry).await {
                    warn!("Failed to cache {}: {}", url, e);
                }
                if let Err(e) = self.cache.set_last_page(1).await {
                    warn!("Failed to record last page: {}", e);
                }

                info!("Extracted {} ({} pages)", url, payload.total_pages);
                state.active_url = Some(url);
                state.payload = Some(payload.clone());
                Ok(payload)
            }
            Err(e) => {
                warn!("Extraction of {} failed: {}", url, e);
                if let Err(clear_err) = self.cache.clear().await {
                    warn!("Failed to clear cache: {}", clear_err);
                }
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch page `n` of the active document.
    pub async fn change_page(&self, n: u32) -> Result<PageChange> {
        let (generation, ticket, url) = {
            let mut state = self.state.lock().await;
            let (Some(url), Some(payload)) = (state.active_url.clone(), state.payload.as_ref())
            else {
                return Err(Error::NoActiveDocument);
            };
            if n == payload.current_page || !payload.contains_page(n) {
                return Ok(PageChange::Unchanged);
            }
            state.page_request += 1;
            state.loading = true;
            (state.generation, state.page_request, url)
        };

        debug!("Fetching page {} of {}", n, url);
        let result = self.api.extract_page(&url, n).await;

        let mut state = self.state.lock().await;
        if state.generation != generation
            || state.page_request != ticket
            || state.active_url.as_deref() != Some(url.as_str())
        {
            debug!("Dropping page {} of {}: session moved on", n, url);
            return Ok(PageChange::Discarded);
        }
        state.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("Fetching page {} of {} failed: {}", n, url, e);
                state.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let Some(mut merged) = state.payload.clone() else {
            return Ok(PageChange::Discarded);
        };
        merged.merge_page(ExtractionPayload {
            current_page: n,
            ..page
        });

        if let Err(e) = self.cache.write(&CacheEntry::new(url.clone(), merged.clone())).await {
            warn!("Failed to cache page {} of {}: {}", n, url, e);
        }

        state.last_error = None;
        state.payload = Some(merged.clone());
        Ok(PageChange::Loaded(merged))
    }

    /// Drop the session: state, cache entry, active URL and last page.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.clear();
        if let Err(e) = self.cache.clear().await {
            warn!("Failed to clear cache on reset: {}", e);
        }
        info!("Session reset");
    }

    /// Ask the backend to download a PDF; returns the URL of its copy.
    pub async fn download_pdf(&self, pdf_url: &str) -> Result<String> {
        let pdf_url = validate_url(pdf_url)?;
        info!("Requesting download of {}", pdf_url);
        self.api.download_pdf(&pdf_url).await
    }
}
