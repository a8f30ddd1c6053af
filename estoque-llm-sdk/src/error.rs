use std::time::Duration;
use thiserror::Error;

/// Error types for LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Authentication failed (HTTP 401/403, or missing credential)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after: Option<u64>,
    },

    /// Invalid request parameters (HTTP 400)
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// API error with status code (HTTP 4xx/5xx except above)
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Network or connection error
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// JSON parsing or serialization error
    #[error("Parse error: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    /// Generic error for unexpected cases
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LlmError {
    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit<S: Into<String>>(message: S, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an API error
    pub fn api_error(status: u16, message: String) -> Self {
        Self::Api { status, message }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// Rate limits, connection failures and server-side (5xx) errors are
    /// transient. Authentication, malformed requests and parse failures are
    /// fatal: repeating the call would fail the same way.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimit { .. } => true,
            LlmError::Network { source } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            LlmError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Delay suggested by the server before the next attempt, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimit {
                retry_after: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}
