//! Typed errors for the site profile library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that abort an analysis run.
///
/// Partial failures never surface here; they are recorded in
/// [`ExtractionMetadata`](crate::types::result::ExtractionMetadata) instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No page with `page_type == homepage` was supplied
    #[error("no homepage in discovered pages ({page_count} pages supplied)")]
    MissingHomepage { page_count: usize },

    /// Configuration rejected before any work started
    #[error("invalid config: {0}")]
    Config(String),
}

/// Errors from a single call to the inference service.
#[derive(Debug, Clone, Error)]
pub enum InferenceError {
    /// The call did not finish within the phase timeout
    #[error("inference timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Network-level failure (connect, TLS, body read)
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-success status
    #[error("inference API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The gateway answered, but the payload is not what the schema asked for
    #[error("invalid inference response: {0}")]
    InvalidResponse(String),

    /// Client misconfiguration (missing key, bad base URL)
    #[error("inference config error: {0}")]
    Config(String),
}

impl InferenceError {
    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Only transport-level trouble is retried. A response that arrived but
    /// failed to parse is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) | Self::Config(_) => false,
        }
    }
}

impl From<serde_json::Error> for InferenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

/// Errors inside debug capture. These never leave the capture task.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("capture manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

/// Result type alias for analysis runs.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Result type alias for inference calls.
pub type InferenceResult<T> = std::result::Result<T, InferenceError>;

/// Result type alias for debug capture.
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(InferenceError::Timeout { timeout_ms: 10 }.is_retryable());
        assert!(InferenceError::Transport("reset".into()).is_retryable());
        assert!(InferenceError::Api {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(InferenceError::Api {
            status: 429,
            message: "slow down".into()
        }
        .is_retryable());
        assert!(!InferenceError::Api {
            status: 400,
            message: "bad schema".into()
        }
        .is_retryable());
        assert!(!InferenceError::InvalidResponse("not json".into()).is_retryable());
    }

    #[test]
    fn test_missing_homepage_message() {
        let err = AnalysisError::MissingHomepage { page_count: 3 };
        assert!(err.to_string().contains("no homepage"));
    }
}
