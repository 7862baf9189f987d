//! Single-slot document cache and its storage backends.

mod sqlite_store;
mod store;

pub use sqlite_store::SqliteStore;
pub use store::{MemoryStore, SessionStore};

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::CacheEntry;

/// Key holding the serialized [`CacheEntry`] (payload plus active URL).
const KEY_DOCUMENT: &str = "extraction_data";
/// Key holding the last viewed page number.
const KEY_CURRENT_PAGE: &str = "current_page";

/// The persisted document session: at most one entry at a time.
///
/// Corrupt stored data is reported as absent (and removed) rather than as a
/// failure, so a storage format change falls back to "no document loaded".
#[derive(Clone)]
pub struct DocumentCache {
    store: Arc<dyn SessionStore>,
}

impl DocumentCache {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Cache that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Durable cache backed by a SQLite file.
    pub fn sqlite(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteStore::new(path)?)))
    }

    /// Read the active entry, if any.
    pub async fn read(&self) -> Result<Option<CacheEntry>> {
        let Some(raw) = self.store.get(KEY_DOCUMENT).await? else {
            return Ok(None);
        };

        match decode_entry(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                warn!("Discarding cached document: {}", e);
                self.store.remove(&[KEY_DOCUMENT, KEY_CURRENT_PAGE]).await?;
                Ok(None)
            }
        }
    }

    /// Replace the active entry.
    pub async fn write(&self, entry: &CacheEntry) -> Result<()> {
        let raw = serde_json::to_string(entry).map_err(|e| Error::Storage(e.to_string()))?;
        self.store.put(KEY_DOCUMENT, &raw).await?;
        debug!(
            "Cached page {}/{} of {}",
            entry.payload.current_page, entry.payload.total_pages, entry.source_url
        );
        Ok(())
    }

    /// Remove the entry, active URL and last viewed page together.
    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&[KEY_DOCUMENT, KEY_CURRENT_PAGE]).await
    }

    /// The last page the reader navigated to.
    pub async fn last_page(&self) -> Result<Option<u32>> {
        let raw = self.store.get(KEY_CURRENT_PAGE).await?;
        Ok(raw.and_then(|value| value.trim().parse().ok()))
    }

    pub async fn set_last_page(&self, page: u32) -> Result<()> {
        self.store.put(KEY_CURRENT_PAGE, &page.to_string()).await
    }
}

fn decode_entry(raw: &str) -> Result<CacheEntry> {
    let entry: CacheEntry =
        serde_json::from_str(raw).map_err(|e| Error::PersistedStateCorrupt(e.to_string()))?;

    let payload = &entry.payload;
    if payload.total_pages == 0 || !payload.contains_page(payload.current_page) {
        return Err(Error::PersistedStateCorrupt(format!(
            "page {} outside 1..={}",
            payload.current_page, payload.total_pages
        )));
    }

    Ok(entry)
}
