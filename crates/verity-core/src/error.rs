//! Error types for Verity API operations.
//!
//! Every failure in the runtime surfaces as [`Error`]. HTTP failures carry a
//! [`GenericApiError`] envelope holding the status line, the raw body and,
//! when the body is JSON, its decoded form.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Payload fragment the Verity server uses while a commit is in progress.
const SYSTEM_BUSY_MARKER: &str = "system is currently being modified";

/// Main error type for Verity operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A caller-supplied argument was missing or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A server variable value is outside the declared enumeration
    #[error("Server variable `{name}` does not allow `{value}` (allowed: {allowed:?})")]
    VariableNotAllowed {
        /// Variable name
        name: String,
        /// Rejected value
        value: String,
        /// Declared choices
        allowed: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Connect, TLS, DNS, read or write failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a status of 300 or above
    #[error("{0}")]
    Api(GenericApiError),

    /// The payload could not be decoded
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// A required property was absent from a strict payload
    #[error("no value given for required property {0}")]
    MissingRequired(String),

    /// More than one oneOf variant matched the payload
    #[error("Ambiguous oneOf payload for {0}")]
    AmbiguousOneOf(String),

    /// No variant of a oneOf/anyOf matched the payload
    #[error("No matching variant for {0}")]
    NoMatchingVariant(String),

    /// The call was canceled or its deadline passed
    #[error("Request canceled")]
    Canceled,
}

/// Specialized result type for Verity operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input, bad configuration or an unserializable parameter
    InvalidArgument,
    /// Network-level failure
    Transport,
    /// HTTP status of 300 or above
    Http(u16),
    /// Decode failure, including missing required and unknown fields
    Decoding,
    /// More than one oneOf variant matched
    AmbiguousOneOf,
    /// No polymorphic variant matched
    NoMatchingVariant,
    /// Canceled or deadline exceeded
    Canceled,
}

impl Error {
    /// Returns the taxonomy bucket for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) | Self::VariableNotAllowed { .. } | Self::ConfigError(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Transport(_) => ErrorKind::Transport,
            Self::Api(err) => ErrorKind::Http(err.status().map_or(0, |s| s.as_u16())),
            Self::Decoding(_) | Self::MissingRequired(_) => ErrorKind::Decoding,
            Self::AmbiguousOneOf(_) => ErrorKind::AmbiguousOneOf,
            Self::NoMatchingVariant(_) => ErrorKind::NoMatchingVariant,
            Self::Canceled => ErrorKind::Canceled,
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::VariableNotAllowed { .. } => "VARIABLE_NOT_ALLOWED",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Api(_) => "HTTP_ERROR",
            Self::Decoding(_) => "DECODING_ERROR",
            Self::MissingRequired(_) => "MISSING_REQUIRED",
            Self::AmbiguousOneOf(_) => "AMBIGUOUS_ONE_OF",
            Self::NoMatchingVariant(_) => "NO_MATCHING_VARIANT",
            Self::Canceled => "CANCELED",
        }
    }

    /// Whether re-issuing the same call may succeed.
    ///
    /// Server errors, 408, 429 and transport failures are retryable, as is
    /// any response whose payload reports that a commit is in progress.
    /// Client errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api(err) => {
                let by_status = err.status().is_some_and(|status| {
                    status.is_server_error()
                        || status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::REQUEST_TIMEOUT
                });
                by_status || err.reports_system_busy()
            }
            _ => false,
        }
    }

    /// Returns the HTTP error envelope when this is an HTTP failure.
    #[must_use]
    pub const fn as_api_error(&self) -> Option<&GenericApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Converts the error into a serializable [`ErrorResponse`].
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        let details = self.as_api_error().and_then(|err| err.model().cloned());
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details,
        }
    }
}

/// Builds an [`Error::InvalidArgument`] from a message.
///
/// Used by operation builders when a required parameter is absent.
#[must_use]
pub fn report_error(message: impl Into<String>) -> Error {
    Error::InvalidArgument(message.into())
}

/// Structured error summary for logging or re-serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Decoded server payload, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error envelope for responses with a status of 300 or above.
#[derive(Clone, PartialEq)]
pub struct GenericApiError {
    message: String,
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Bytes,
    model: Option<serde_json::Value>,
}

impl GenericApiError {
    /// Creates an envelope with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            model: None,
        }
    }

    /// Creates an envelope from a buffered HTTP response.
    ///
    /// The message is the status line; the model is the body decoded as JSON
    /// when that succeeds.
    #[must_use]
    pub fn from_response(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        let model = serde_json::from_slice(&body).ok();
        Self {
            message: status_line(status),
            status: Some(status),
            headers,
            body,
            model,
        }
    }

    /// The status line or failure description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Raw response body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decoded response body, when it was valid JSON.
    #[must_use]
    pub const fn model(&self) -> Option<&serde_json::Value> {
        self.model.as_ref()
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn reports_system_busy(&self) -> bool {
        self.model
            .as_ref()
            .and_then(|model| model.get("payload"))
            .and_then(serde_json::Value::as_str)
            .is_some_and(|payload| payload.to_lowercase().contains(SYSTEM_BUSY_MARKER))
    }
}

impl fmt::Display for GenericApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for GenericApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericApiError")
            .field("message", &self.message)
            .field("status", &self.status)
            .field("body", &String::from_utf8_lossy(&self.body))
            .finish_non_exhaustive()
    }
}

impl std::error::Error for GenericApiError {}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidArgument(err.to_string())
        } else if err.is_decode() {
            Self::Decoding(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidArgument(format!("invalid URL: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}
