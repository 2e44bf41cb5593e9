//! Device API error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("device is not paired (401 Unauthorized)")]
    Unauthorized,

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Whether the server rejected the device credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
