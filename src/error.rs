//! User-facing error surface.
//!
//! Every service owns its own `thiserror` enum. This module adds the shared
//! pieces: the [`UserFacing`] trait that turns any of those into a stable code
//! and a toast-friendly message, input validation that runs before any
//! network call, and message-based classification for remote failures.

use canvas::doc::DocError;
use canvas::engine::CanvasError;

/// Stable error code plus a message safe to show to the user.
pub trait UserFacing: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    /// Message for a toast. Defaults to the `Display` text.
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl UserFacing for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Required { .. } => "E_REQUIRED",
            Self::TooLong { .. } => "E_TOO_LONG",
        }
    }
}

/// Trimmed `value`, or `Required` when it is blank.
pub fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(trimmed)
}

/// Reject values longer than `max` characters.
pub fn max_chars(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Coarse category of a remote failure, derived from its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Timeout,
    Network,
    RateLimit,
    Unknown,
}

impl ErrorClass {
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("timeout") || lower.contains("timed out") || lower.contains("abort") {
            Self::Timeout
        } else if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
            Self::RateLimit
        } else if lower.contains("failed to send")
            || lower.contains("network")
            || lower.contains("connection")
            || lower.contains("fetch")
        {
            Self::Network
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn friendly_message(self) -> &'static str {
        match self {
            Self::Timeout => "The request took too long. Please try again.",
            Self::Network => "Could not reach the server. Check your connection and try again.",
            Self::RateLimit => "Too many requests right now. Please wait a moment and try again.",
            Self::Unknown => "Something went wrong. Please try again.",
        }
    }
}

// =============================================================================
// CANVAS ERRORS
// =============================================================================

impl UserFacing for DocError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_DOC_PARSE",
            Self::Content { .. } => "E_DOC_CONTENT",
            Self::KindMismatch { .. } => "E_KIND_MISMATCH",
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Parse(_) | Self::Content { .. } => "This canvas could not be read.".to_owned(),
            Self::KindMismatch { .. } => self.to_string(),
        }
    }
}

impl UserFacing for CanvasError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::KindNotAllowed { .. } => "E_KIND_NOT_ALLOWED",
            Self::NotFound(_) => "E_ELEMENT_NOT_FOUND",
            Self::Doc(inner) => inner.error_code(),
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Doc(inner) => inner.user_message(),
            Self::KindNotAllowed { .. } | Self::NotFound(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
