//! Maps raw attempt failures onto [`ErrorKind`].

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{AppError, ErrorKind, RawError};
use crate::http_client::HttpErrorKind;

/// Connectivity hint consulted when a request got no response.
pub trait NetworkStatus: Debug + Send + Sync {
    fn is_online(&self) -> bool;
}

/// Treats the client as always online; silent failures become timeouts.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeOnline;

impl NetworkStatus for AssumeOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Shared connectivity flag flipped by the presentation layer.
#[derive(Debug, Clone)]
pub struct NetworkFlag(Arc<AtomicBool>);

impl NetworkFlag {
    pub fn new(online: bool) -> Self {
        Self(Arc::new(AtomicBool::new(online)))
    }

    pub fn set_online(&self, online: bool) {
        self.0.store(online, Ordering::Relaxed);
    }
}

impl Default for NetworkFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkStatus for NetworkFlag {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    network: Arc<dyn NetworkStatus>,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(Arc::new(AssumeOnline))
    }
}

impl ErrorClassifier {
    pub fn new(network: Arc<dyn NetworkStatus>) -> Self {
        Self { network }
    }

    /// Idempotent: an already classified error is returned untouched.
    pub fn classify(&self, raw: impl Into<RawError>) -> AppError {
        match raw.into() {
            RawError::Classified(error) => error,
            RawError::Status { status, message } => classify_status(status, message),
            RawError::Transport(error) => match error.kind() {
                HttpErrorKind::NoResponse if self.network.is_online() => {
                    AppError::new(ErrorKind::Timeout, "Request timeout").with_cause(error.message())
                }
                HttpErrorKind::NoResponse => {
                    AppError::new(ErrorKind::NetworkError, "No internet connection")
                        .with_cause(error.message())
                }
                HttpErrorKind::Request => unknown(error.message()),
            },
            RawError::Other(message) => unknown(&message),
        }
    }

    pub fn is_retryable(&self, error: &AppError) -> bool {
        error.is_retryable()
    }
}

fn classify_status(status: u16, message: Option<String>) -> AppError {
    let error = match status {
        401 => AppError::new(ErrorKind::AuthError, "Authentication failed"),
        403 => AppError::new(ErrorKind::AuthError, "Access forbidden"),
        404 => AppError::new(ErrorKind::NotFound, "Resource not found"),
        429 => AppError::new(ErrorKind::RateLimit, "Rate limit exceeded"),
        _ => AppError::new(
            ErrorKind::ApiError,
            message
                .clone()
                .unwrap_or_else(|| String::from("API request failed")),
        ),
    };

    let error = error.with_status(status);
    match message {
        Some(message) => error.with_cause(message),
        None => error,
    }
}

fn unknown(message: &str) -> AppError {
    let message = message.trim();
    if message.is_empty() {
        AppError::new(ErrorKind::Unknown, "An unexpected error occurred")
    } else {
        AppError::new(ErrorKind::Unknown, message).with_cause(message)
    }
}
