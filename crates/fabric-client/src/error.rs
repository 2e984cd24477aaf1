//! Error types for fabric API operations.
//!
//! Errors are categorized to drive retry logic and user-facing advice.

use std::fmt;

/// Result type alias for fabric API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transport failures, timeouts, throttling and server errors.
    Network,
    /// Missing or rejected credentials.
    Auth,
    /// The addressed resource does not exist.
    NotFound,
    /// The request was rejected as invalid.
    Client,
    /// The response body could not be understood.
    Format,
    /// Local misconfiguration.
    Config,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network)
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "Authentication failed",
            Self::NotFound => "Resource not found",
            Self::Client => "Request rejected by the controller",
            Self::Format => "Unexpected response format",
            Self::Config => "Invalid client configuration",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check connectivity to the controller and try again",
            Self::Auth => "Check the API token (HYPERFAB_TOKEN) and its permissions",
            Self::NotFound => "Verify the resource path; it may have been deleted",
            Self::Client => "Check the declared attribute values",
            Self::Format => "The controller API version may not be supported",
            Self::Config => "Check the endpoint and token settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the fabric controller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    Http {
        message: String,
        /// HTTP status code if the controller answered
        status: Option<u16>,
    },

    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid response from the API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// Client misconfiguration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Get the error category for retry logic.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http { status, .. } => match status {
                None | Some(408 | 429 | 500..=599) => ErrorCategory::Network,
                Some(401 | 403) => ErrorCategory::Auth,
                Some(404) => ErrorCategory::NotFound,
                Some(_) => ErrorCategory::Client,
            },
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::InvalidResponse(_) => ErrorCategory::Format,
            Self::Config(_) => ErrorCategory::Config,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<Error> for reconcile::Error {
    fn from(err: Error) -> Self {
        Self::remote(err)
    }
}
