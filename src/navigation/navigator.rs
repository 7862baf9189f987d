//! Async driver tying the page cursor to the extraction client and cache.

use std::sync::{Arc, Mutex};

use tokio::time::Instant;
use tracing::{debug, warn};

use super::cursor::{Decision, NavigationTiming, Outcome, PageCursor, Phase, Rejection};
use crate::error::{Error, Result};
use crate::models::ExtractionPayload;
use crate::services::{ExtractionClient, PageChange};

/// Result of a navigation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    Loaded(ExtractionPayload),
    Rejected(Rejection),
    /// The session changed under the request.
    Discarded,
}

pub struct Navigator {
    client: Arc<ExtractionClient>,
    timing: NavigationTiming,
    /// `None` while no document is open. Never held across an await.
    cursor: Mutex<Option<PageCursor>>,
}

impl Navigator {
    /// Navigator positioned on the client's current page, if any.
    pub async fn new(client: Arc<ExtractionClient>, timing: NavigationTiming) -> Self {
        let cursor = client
            .current()
            .await
            .map(|p| PageCursor::new(p.current_page, p.total_pages, timing));
        Self {
            client,
            timing,
            cursor: Mutex::new(cursor),
        }
    }

    pub fn client(&self) -> &ExtractionClient {
        &self.client
    }

    fn with_cursor<T>(&self, f: impl FnOnce(&mut Option<PageCursor>) -> T) -> T {
        let mut guard = self.cursor.lock().expect("navigator cursor lock poisoned");
        f(&mut guard)
    }

    /// Open a new document and place the cursor on its first page.
    pub async fn open(&self, url: &str) -> Result<ExtractionPayload> {
        self.with_cursor(|c| *c = None);
        let payload = self.client.extract(url).await?;
        let timing = self.timing;
        self.with_cursor(|c| {
            *c = Some(PageCursor::new(1, payload.total_pages, timing));
        });
        Ok(payload)
    }

    pub async fn reset(&self) {
        self.with_cursor(|c| *c = None);
        self.client.reset().await;
    }

    /// Page shown in the indicator.
    pub fn current_page(&self) -> Option<u32> {
        self.with_cursor(|c| c.as_ref().map(PageCursor::current_page))
    }

    pub fn total_pages(&self) -> Option<u32> {
        self.with_cursor(|c| c.as_ref().map(PageCursor::total_pages))
    }

    pub fn phase(&self) -> Option<Phase> {
        let now = Instant::now();
        self.with_cursor(|c| c.as_mut().map(|c| c.tick(now)))
    }

    pub fn spinner_visible(&self) -> bool {
        let now = Instant::now();
        self.with_cursor(|c| c.as_ref().is_some_and(|c| c.spinner_visible(now)))
    }

    pub async fn previous(&self) -> Result<Navigation> {
        let target = self.with_cursor(|c| c.as_ref().map(PageCursor::previous_target));
        self.request_page(target.ok_or(Error::NoActiveDocument)?).await
    }

    pub async fn next(&self) -> Result<Navigation> {
        let target = self.with_cursor(|c| c.as_ref().map(PageCursor::next_target));
        self.request_page(target.ok_or(Error::NoActiveDocument)?).await
    }

    /// Navigate to page `n`.
    ///
    /// Rejected requests make no network call. A failed fetch rolls the
    /// indicator back and returns the error; the previous page stays cached.
    pub async fn request_page(&self, n: u32) -> Result<Navigation> {
        let decision = self.with_cursor(|c| {
            c.as_mut()
                .map(|cursor| cursor.request_page(n, Instant::now()))
        });
        match decision {
            None => return Err(Error::NoActiveDocument),
            Some(Decision::Rejected(reason)) => {
                debug!("Page {} request rejected: {:?}", n, reason);
                return Ok(Navigation::Rejected(reason));
            }
            Some(Decision::Accepted(_)) => {}
        }

        if let Err(e) = self.client.cache().set_last_page(n).await {
            warn!("Failed to record last page: {}", e);
        }

        let result = self.client.change_page(n).await;
        let now = Instant::now();

        let (outcome, navigation) = match result {
            Ok(PageChange::Loaded(payload)) => {
                (Outcome::Loaded(payload.current_page), Ok(Navigation::Loaded(payload)))
            }
            Ok(PageChange::Unchanged) => (Outcome::Failed, Ok(Navigation::Rejected(Rejection::SamePage))),
            Ok(PageChange::Discarded) => (Outcome::Failed, Ok(Navigation::Discarded)),
            Err(e) => (Outcome::Failed, Err(e)),
        };

        if !matches!(outcome, Outcome::Loaded(_)) {
            let displayed = self.with_cursor(|c| c.as_ref().map(PageCursor::displayed_page));
            if let Some(page) = displayed {
                if let Err(e) = self.client.cache().set_last_page(page).await {
                    warn!("Failed to restore last page: {}", e);
                }
            }
        }

        self.with_cursor(|c| {
            if let Some(cursor) = c.as_mut() {
                cursor.resolve(outcome, now);
            }
        });
        navigation
    }
}
