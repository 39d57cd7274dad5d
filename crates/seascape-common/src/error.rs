//! Error types for the seascape pipeline.

use std::time::Duration;

use thiserror::Error;

use crate::crs::CrsCode;

/// Result type alias using SeascapeError.
pub type SeascapeResult<T> = Result<T, SeascapeError>;

/// Broad handling class of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or settings; fatal, never retried.
    Configuration,
    /// A remote data service failed; may be retried.
    Remote,
    /// Internal failure (geometry, projection, I/O).
    Internal,
}

/// Failures talking to a remote data service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request to {url} timed out after {}s", elapsed.as_secs_f64())]
    Timeout { url: String, elapsed: Duration },

    /// `body` holds the start of the error page, which some servers use to
    /// tell "no data" apart from "no such resource".
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16, body: String },

    #[error("rate limited by {url}")]
    RateLimited { url: String },

    #[error("malformed payload from {url}: {message}")]
    MalformedPayload { url: String, message: String },

    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
}

impl RemoteError {
    /// Timeouts, transport failures, 5xx and 429 are worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Timeout { .. }
            | RemoteError::Transport { .. }
            | RemoteError::RateLimited { .. } => true,
            RemoteError::Http { status, .. } => *status >= 500,
            RemoteError::MalformedPayload { .. } => false,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            RemoteError::Timeout { url, .. }
            | RemoteError::Http { url, .. }
            | RemoteError::RateLimited { url }
            | RemoteError::MalformedPayload { url, .. }
            | RemoteError::Transport { url, .. } => url,
        }
    }
}

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum SeascapeError {
    // === Configuration errors ===
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("Invalid basemap scale '{0}', expected small, medium or large")]
    InvalidScale(String),

    #[error("Catalog lookup failed for '{code}': {reason}")]
    LookupFailed { code: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Buffering requires a metric CRS, got {0}")]
    NonMetricBuffer(CrsCode),

    // === Remote errors ===
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Basemap unavailable for '{region}': {reason}")]
    BasemapUnavailable {
        region: String,
        reason: String,
        #[source]
        source: Option<RemoteError>,
    },

    // === Internal errors ===
    #[error("CRS mismatch: {left} vs {right}")]
    CrsMismatch { left: CrsCode, right: CrsCode },

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeascapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SeascapeError::InvalidBounds(_)
            | SeascapeError::UnknownCrs(_)
            | SeascapeError::InvalidScale(_)
            | SeascapeError::LookupFailed { .. }
            | SeascapeError::InvalidConfig(_)
            | SeascapeError::NonMetricBuffer(_) => ErrorCategory::Configuration,

            SeascapeError::Remote(_) | SeascapeError::BasemapUnavailable { .. } => {
                ErrorCategory::Remote
            }

            SeascapeError::CrsMismatch { .. }
            | SeascapeError::Projection(_)
            | SeascapeError::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            SeascapeError::Remote(err) => err.is_retryable(),
            SeascapeError::BasemapUnavailable {
                source: Some(err), ..
            } => err.is_retryable(),
            _ => false,
        }
    }

    /// Shorthand for a basemap failure with no remote cause.
    pub fn basemap_unavailable(region: impl Into<String>, reason: impl Into<String>) -> Self {
        SeascapeError::BasemapUnavailable {
            region: region.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub fn lookup_failed(code: impl Into<String>, reason: impl Into<String>) -> Self {
        SeascapeError::LookupFailed {
            code: code.into(),
            reason: reason.into(),
        }
    }
}
