//! Error taxonomy shared by the extraction client, cache and navigator.

use thiserror::Error;

/// Errors surfaced by the session core.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed user input, caught before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Non-2xx or malformed response from the extraction/backend API.
    #[error("{0}")]
    RemoteExtraction(String),

    /// Page change requested without a prior successful extraction.
    #[error("No active document; extract a URL first")]
    NoActiveDocument,

    /// Persisted session state could not be parsed.
    #[error("Persisted state is corrupt: {0}")]
    PersistedStateCorrupt(String),

    /// The session moved on (reset or new extraction) before the result arrived.
    #[error("Request superseded by a newer session")]
    Superseded,

    /// The local cache backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error originated in the remote service rather than locally.
    pub fn is_remote(&self) -> bool {
        matches!(self, Error::RemoteExtraction(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Message used when the remote service gives no detail of its own.
pub const GENERIC_EXTRACTION_FAILURE: &str = "Failed to extract content";
