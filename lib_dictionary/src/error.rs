//! # Error Types
//!
//! Two families of errors live here. `FetchFailure` describes why one upstream
//! lookup could not produce a usable answer; it never escapes the fetch worker.
//! `DictionaryError` is what the public API returns: internal faults such as a
//! poisoned cache lock, snapshot problems, or client construction failures.

use thiserror::Error;

/// Why a single remote lookup failed.
///
/// Every variant is cached as a short-lived placeholder entry by the fetch
/// worker and logged as an error. The "word not found" answer is *not* a
/// failure and is reported through `FetchOutcome::NotFound` instead.
#[derive(Debug, Error)]
pub enum FetchFailure {
    /// The request could not be sent or the body could not be read.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The upstream answered with a server error or asked us to slow down.
    #[error("upstream returned status {0}")]
    UpstreamStatus(u16),

    /// The body matched neither the not-found nor the found shape.
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors surfaced by the public dictionary API.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// A thread panicked while holding the cache lock.
    #[error("cache lock poisoned")]
    CachePoisoned,

    /// A snapshot blob could not be encoded or decoded.
    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// The snapshot was written in a format this build does not read.
    #[error("unsupported snapshot version {0}")]
    SnapshotVersion(u32),

    /// Reading or writing a snapshot file failed.
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    /// The configured upstream url does not parse.
    #[error("invalid upstream url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The upstream url cannot take a word as a path segment (e.g. `mailto:`).
    #[error("upstream url cannot be used as a base: {0}")]
    UnusableBaseUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// The fetch worker task ended with a panic.
    #[error("fetch worker stopped abnormally: {0}")]
    WorkerStopped(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = DictionaryError> = std::result::Result<T, E>;
