/// Error types for the processing service client
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for token and process API operations
#[derive(Error, Debug)]
pub enum HubError {
    /// Client could not be configured
    #[error("Client configuration failed: {0}")]
    Configuration(String),

    /// Identity service refused the credential exchange
    #[error("Authentication failed (HTTP {status}): {body}")]
    Authentication { status: u16, body: String },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Process API answered with a non-success status
    #[error("Process API error (HTTP {status}): {body}")]
    ProcessApi { status: u16, body: String },

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Request window ends before it starts
    #[error("Invalid time range: end {end} precedes start {start}")]
    InvalidTimeRange { start: NaiveDate, end: NaiveDate },

    /// Request options out of range
    #[error("Invalid request options: {0}")]
    InvalidOptions(String),
}

impl HubError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            HubError::Network(_) | HubError::Timeout(_) => true,
            HubError::ProcessApi { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, HubError::Authentication { .. })
    }

    /// Splits transport failures into timeouts and everything else.
    #[cfg(feature = "api")]
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HubError::Timeout(err.to_string())
        } else {
            HubError::Network(err.to_string())
        }
    }
}

/// Type alias for Results using HubError
pub type Result<T> = std::result::Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(HubError::Network("reset".into()).is_retryable());
        assert!(HubError::Timeout("60s".into()).is_retryable());
        assert!(HubError::ProcessApi { status: 503, body: String::new() }.is_retryable());
        assert!(HubError::ProcessApi { status: 429, body: String::new() }.is_retryable());
        assert!(!HubError::ProcessApi { status: 400, body: String::new() }.is_retryable());
        assert!(!HubError::Authentication { status: 401, body: String::new() }.is_retryable());
        assert!(HubError::Authentication { status: 401, body: String::new() }.is_authentication());
        assert!(!HubError::InvalidResponse("eof".into()).is_retryable());
    }
}
