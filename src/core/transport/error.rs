//! Transport error classification and user-facing messages.

use std::fmt;

/// Category of a failed backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Timeout,
    Server,
    Validation,
    Authentication,
    Authorization,
    RateLimit,
    Unknown,
}

impl ErrorKind {
    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::Network => {
                "Network connection failed. Please check your internet connection and try again."
            }
            ErrorKind::Timeout => "Request timed out. Please try again.",
            ErrorKind::Server => "Server error occurred. Please try again later.",
            ErrorKind::Validation => "Invalid data provided. Please check your input.",
            ErrorKind::Authentication => "Authentication failed. Please log in again.",
            ErrorKind::Authorization => "You do not have permission to perform this action.",
            ErrorKind::RateLimit => "Too many requests. Please wait a moment and try again.",
            ErrorKind::Unknown => "An unexpected error occurred. Please try again.",
        }
    }

    /// Transient failures a caller may reasonably retry.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server
        )
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorKind::Authentication,
            403 => ErrorKind::Authorization,
            400 | 422 => ErrorKind::Validation,
            429 => ErrorKind::RateLimit,
            s if s >= 500 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Server => "server",
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::Authorization => "authorization",
            ErrorKind::RateLimit => "rate limit",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// A failed backend call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {}", message_for(.kind, .detail))]
pub struct TransportError {
    pub kind: ErrorKind,
    /// Message supplied by the server, if any.
    pub detail: Option<String>,
}

fn message_for<'a>(kind: &ErrorKind, detail: &'a Option<String>) -> &'a str {
    match detail.as_deref().map(str::trim) {
        Some(d) if !d.is_empty() => d,
        _ => kind.default_message(),
    }
}

impl TransportError {
    pub fn new(kind: ErrorKind) -> Self {
        TransportError { kind, detail: None }
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        TransportError {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// Text to show the user: the server's own message when it sent one.
    pub fn user_message(&self) -> &str {
        message_for(&self.kind, &self.detail)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            ErrorKind::Timeout
        } else if let Some(status) = e.status() {
            ErrorKind::from_status(status.as_u16())
        } else if e.is_connect() || e.is_request() {
            ErrorKind::Network
        } else {
            ErrorKind::Unknown
        };
        log::warn!("request failed ({}): {}", kind, e);
        TransportError::new(kind)
    }
}
