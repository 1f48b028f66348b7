// src/errors.rs
use thiserror::Error;

/// Failure taxonomy for the ingestion pipeline.
///
/// `Throttled` is the only retryable variant; the fetcher absorbs it with
/// bounded backoff. Insufficient candle history is not an error at all:
/// detectors return `None` for it.
#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("provider throttled the request (status {status})")]
    Throttled { status: u16 },

    #[error("provider request failed{}: {}", .status.map(|s| format!(" (status {})", s)).unwrap_or_default(), .message)]
    Provider { status: Option<u16>, message: String },

    #[error("malformed provider payload: {0}")]
    Parse(String),

    #[error("ingestion cycle failed: {source}")]
    CycleFailed {
        #[source]
        source: Box<ScannerError>,
    },
}

impl ScannerError {
    /// Machine-readable kind, surfaced by the HTTP boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            ScannerError::Throttled { .. } => "throttled",
            ScannerError::Provider { .. } => "provider",
            ScannerError::Parse(_) => "parse",
            ScannerError::CycleFailed { .. } => "cycle_failed",
        }
    }

    pub fn is_throttled(&self) -> bool {
        matches!(self, ScannerError::Throttled { .. })
    }
}

impl From<reqwest::Error> for ScannerError {
    fn from(e: reqwest::Error) -> Self {
        ScannerError::Provider {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}
