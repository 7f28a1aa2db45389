use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_client::{HttpError, HttpResponse};

/// Validation errors raised before a request ever reaches the queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid range '{value}', expected one of 1D, 1W, 1M, 3M, 1Y")]
    InvalidRange { value: String },

    #[error("page cursor must point at {base_url}: '{cursor}'")]
    ForeignCursor { cursor: String, base_url: String },

    #[error("timestamp must be RFC3339: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("epoch milliseconds {value} are out of range")]
    TimestampOutOfRange { value: i64 },
}

/// Closed taxonomy of failures surfaced by the data access layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ApiError,
    RateLimit,
    NetworkError,
    AuthError,
    ValidationError,
    NotFound,
    Timeout,
    Unknown,
}

impl ErrorKind {
    pub const ALL: [Self; 8] = [
        Self::ApiError,
        Self::RateLimit,
        Self::NetworkError,
        Self::AuthError,
        Self::ValidationError,
        Self::NotFound,
        Self::Timeout,
        Self::Unknown,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiError => "API_ERROR",
            Self::RateLimit => "RATE_LIMIT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::AuthError => "AUTH_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Transient kinds that are worth another attempt.
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout | Self::RateLimit)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified error handed to presentation code.
///
/// Immutable once built. Produced by [`crate::classifier::ErrorClassifier`]
/// and by input validation; never constructed from a raw transport failure
/// anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    kind: ErrorKind,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            http_status: None,
            cause: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }

    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Heading shown above the message, e.g. `RATE LIMIT`.
    pub fn title(&self) -> String {
        self.kind.as_str().replace('_', " ")
    }

    /// Human readable text keyed off the error kind.
    pub fn user_message(&self) -> &str {
        match self.kind {
            ErrorKind::NetworkError => "Please check your internet connection",
            ErrorKind::RateLimit => "Too many requests. Please try again later",
            ErrorKind::AuthError => "Authentication failed. Please try again",
            _ => &self.message,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        Self::new(ErrorKind::ValidationError, error.to_string())
    }
}

/// Failure of a single attempt, before classification.
#[derive(Debug, Clone, Error)]
pub enum RawError {
    /// The upstream answered with a non-success status.
    #[error("upstream returned status {status}")]
    Status { status: u16, message: Option<String> },
    #[error(transparent)]
    Transport(#[from] HttpError),
    #[error("{0}")]
    Other(String),
    #[error(transparent)]
    Classified(#[from] AppError),
}

impl RawError {
    /// Builds a status failure, lifting the server supplied message when the
    /// body is a JSON object with a `message` or `error` field.
    pub fn from_response(response: &HttpResponse) -> Self {
        let message = serde_json::from_str::<UpstreamErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message.or(body.error))
            .filter(|message| !message.trim().is_empty());

        Self::Status {
            status: response.status,
            message,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

impl From<ValidationError> for RawError {
    fn from(error: ValidationError) -> Self {
        Self::Classified(AppError::from(error))
    }
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: Option<String>,
    error: Option<String>,
}
