//! Mediator error types

use thiserror::Error;

/// Mediator failure with classification.
///
/// The turn coordinator never retries; the kind exists so logs can
/// distinguish a bad key from a flaky backend.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct MediatorError {
    pub kind: MediatorErrorKind,
    pub message: String,
}

impl MediatorError {
    pub fn new(kind: MediatorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(MediatorErrorKind::Network, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(MediatorErrorKind::RateLimit, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(MediatorErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(MediatorErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(MediatorErrorKind::InvalidRequest, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(MediatorErrorKind::MalformedResponse, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(MediatorErrorKind::Unknown, message)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediatorErrorKind {
    /// Network issues, timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Server error (5xx)
    ServerError,
    /// Authentication failed (401, 403)
    Auth,
    /// Bad request (400)
    InvalidRequest,
    /// 2xx body that does not match the expected shape
    MalformedResponse,
    /// Unknown error
    Unknown,
}

impl MediatorErrorKind {
    /// Whether a caller with a retry policy could reasonably retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network | Self::RateLimit | Self::ServerError)
    }
}
