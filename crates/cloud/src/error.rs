//! Error types for the service client.

use thiserror::Error;

/// Errors produced when talking to the prediction/analytics service.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("decoding response: {0}")]
    Decode(String),

    #[error("prediction {id} failed: {reason}")]
    PredictionFailed { id: String, reason: String },

    #[error("prediction {id} still running after {polls} polls")]
    Timeout { id: String, polls: u32 },

    #[error("core error: {0}")]
    Core(#[from] yieldmap_core::Error),
}

impl CloudError {
    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error means the requested resource does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result alias for service operations.
pub type Result<T> = std::result::Result<T, CloudError>;
