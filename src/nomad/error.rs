// ABOUTME: Error type for Orchestration API calls.
// ABOUTME: Separates transport failures from scheduler rejections.

/// Errors from talking to the scheduler's HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid scheduler address '{0}'")]
    InvalidAddress(String),

    #[error("cannot reach {address}: {reason}")]
    Connection { address: String, reason: String },

    #[error("request failed: {0}")]
    Request(String),

    /// The scheduler answered with a non-success status.
    #[error("scheduler returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
