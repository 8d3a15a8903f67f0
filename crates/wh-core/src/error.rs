//! Error types for WH Open API operations.
//!
//! The serialization core has a single usage error (a deep-object parameter
//! given a non-object value). The remaining variants belong to request
//! construction and to mapping transport responses back into errors.

use thiserror::Error;

/// Main error type for WH Open API operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A `deepObject` parameter was given a value that is not an object
    #[error("An object must be provided for key {key} as it is a deep object")]
    DeepObjectRequired {
        /// Parameter key that received the non-object value
        key: String,
    },

    /// A required request parameter was absent
    #[error("Required parameter {name} was null or undefined when calling {operation}")]
    MissingParameter {
        /// Parameter name
        name: String,
        /// Operation being built
        operation: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A header name or value could not be represented
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// A URL could not be built from the base path and request path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Serialization or deserialization of a JSON payload failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The transport failed to deliver the request
    #[error("Transport error: {0}")]
    Transport(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with details
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Authentication or authorization failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Service is unavailable or overloaded
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Any other non-success HTTP status
    #[error("HTTP error {status}: {message}")]
    Http {
        /// Status code returned by the server
        status: u16,
        /// Response body or reason
        message: String,
    },
}

/// Specialized result type for WH Open API operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DeepObjectRequired { .. } => "DEEP_OBJECT_REQUIRED",
            Self::MissingParameter { .. } => "MISSING_PARAMETER",
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidHeader(_) => "INVALID_HEADER",
            Self::InvalidUrl(_) => "INVALID_URL",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Conflict(_) => "CONFLICT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Http { .. } => "HTTP_ERROR",
        }
    }

    /// Returns true for caller bugs that must be fixed rather than retried.
    #[must_use]
    pub const fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::DeepObjectRequired { .. } | Self::MissingParameter { .. }
        )
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Transport(_) | Self::ServiceUnavailable(_)
        )
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderValue> for Error {
    fn from(err: reqwest::header::InvalidHeaderValue) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}

impl From<reqwest::header::InvalidHeaderName> for Error {
    fn from(err: reqwest::header::InvalidHeaderName) -> Self {
        Self::InvalidHeader(err.to_string())
    }
}
