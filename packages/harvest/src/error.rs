//! Typed errors for the harvesting pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can match
//! on what went wrong.

use thiserror::Error;

/// Errors surfaced by the harvesting core.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Provider request failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Root domain is empty or not a hostname
    #[error("invalid root domain: {domain:?}")]
    InvalidDomain { domain: String },

    /// Domain pattern failed to compile
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Provider URL could not be built
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// `start()` called on a service that is already running
    #[error("service already running: {name}")]
    AlreadyRunning { name: String },

    /// Concurrency gate was closed while waiting for permits
    #[error("concurrency gate closed")]
    GateClosed,

    /// Configuration value missing or malformed
    #[error("config error: {0}")]
    Config(String),
}

/// Errors raised by the HTTP collaborator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure (DNS, connect, TLS, timeout)
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Provider answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// Response body could not be read
    #[error("failed reading body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for harvesting operations.
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;
