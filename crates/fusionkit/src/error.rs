//! Error types for Fusion API operations.
//!
//! Errors are categorized so callers can tell an absent resource apart from
//! a transport or authentication failure, and decide what to tell the user.

use std::fmt;

/// Result type alias for Fusion API operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Fusion API errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network or server-side failure.
    Network,
    /// The requested resource does not exist.
    NotFound,
    /// Credentials were missing or rejected.
    Auth,
    /// The request was rejected as invalid by the server.
    Rejected,
    /// An asynchronous operation ended in failure or never finished.
    Operation,
    /// The response could not be decoded.
    Format,
}

impl ErrorCategory {
    /// Whether this category means the resource is simply absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::NotFound => "Resource not found",
            Self::Auth => "Authentication failed",
            Self::Rejected => "Request rejected by the API",
            Self::Operation => "Remote operation failed",
            Self::Format => "Invalid API response",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check the API host and your connection, then try again",
            Self::NotFound => "Verify the resource name and its tenant, space or zone",
            Self::Auth => "Check the access token or refresh it",
            Self::Rejected => "Check the requested values against the API limits",
            Self::Operation => "Inspect the operation in the Fusion console",
            Self::Format => "The API version may not match this client",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the Fusion API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {message}")]
    HttpError {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Session could not be opened.
    #[error("cannot open session: {0}")]
    Session(String),

    /// A remote operation reached the `Failed` state.
    #[error("operation {id} failed: {reason}")]
    OperationFailed {
        /// Operation id.
        id: String,
        /// Failure reason reported by the API.
        reason: String,
    },

    /// A remote operation did not reach a terminal state in time.
    #[error("operation {id} did not finish within {waited_secs}s")]
    OperationTimedOut {
        /// Operation id.
        id: String,
        /// Seconds spent waiting.
        waited_secs: u64,
    },

    /// Invalid response from API.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// A name cannot be placed in a request path.
    #[error("'{0}' cannot be used as a name in a request path")]
    InvalidPathSegment(String),
}

impl Error {
    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::HttpError {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::HttpError { status, .. } => match status {
                Some(404) => ErrorCategory::NotFound,
                Some(401 | 403) => ErrorCategory::Auth,
                Some(400 | 409 | 422) => ErrorCategory::Rejected,
                _ => ErrorCategory::Network,
            },
            Error::Session(_) => ErrorCategory::Auth,
            Error::OperationFailed { .. } | Error::OperationTimedOut { .. } => {
                ErrorCategory::Operation
            }
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::InvalidPathSegment(_) => ErrorCategory::Rejected,
        }
    }

    /// Whether the error means the requested resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.category().is_not_found()
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::HttpError {
                message: format!("HTTP {}", code),
                status: Some(code),
            },
            other => Self::HttpError {
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

/// Turn a 404 into `None`, keeping every other error.
pub(crate) fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
