//! Unified error types for sitecache.

use tokio_rusqlite::rusqlite;

/// Unified error types for the offline cache worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty cache name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A write targeted a store that no longer exists.
    #[error("CACHE_ERROR: store not found: {0}")]
    StoreNotFound(String),

    /// Stored headers could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Network fetch rejected (offline, DNS failure, connection reset).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Network fetch timed out at the transport.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Network failed and no cached copy exists.
    #[error("UNAVAILABLE: {url} ({cause})")]
    Unavailable { url: String, cause: String },

    /// Precaching failed during install.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Lifecycle operation called from the wrong state.
    #[error("INVALID_STATE: cannot {operation} while {state}")]
    InvalidState { operation: &'static str, state: String },
}

impl Error {
    /// Whether this error came from the network rather than from storage or lifecycle.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::FetchTimeout(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
