//! Error handling and custom error types
//!
//! Provides unified error handling across the proxy and the client library
//! using thiserror.

use thiserror::Error;

/// Substrings that mark an upstream failure as a safety-policy rejection.
const SAFETY_MARKERS: &[&str] = &["SAFETY", "safety", "content_policy_violation"];

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Content policy violation: {0}")]
    ContentPolicy(String),

    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    /// True when the error text carries one of the provider safety markers.
    pub fn is_safety_rejection(&self) -> bool {
        match self {
            Error::ContentPolicy(_) => true,
            Error::AiProvider(message) | Error::Generic(message) => {
                SAFETY_MARKERS.iter().any(|marker| message.contains(marker))
            }
            _ => false,
        }
    }

    /// Rewrites provider errors that carry a safety marker into
    /// [`Error::ContentPolicy`]; everything else passes through unchanged.
    pub fn classify(self) -> Self {
        if matches!(self, Error::ContentPolicy(_)) || !self.is_safety_rejection() {
            return self;
        }
        Error::ContentPolicy(self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_marker_is_rewritten() {
        let err = Error::AiProvider("Gemini blocked the prompt: SAFETY".to_string()).classify();
        assert!(matches!(err, Error::ContentPolicy(_)));
    }

    #[test]
    fn test_openai_policy_code_is_rewritten() {
        let err = Error::AiProvider(
            "OpenAI API error (status 400): {\"code\":\"content_policy_violation\"}".to_string(),
        )
        .classify();
        assert!(matches!(err, Error::ContentPolicy(_)));
    }

    #[test]
    fn test_plain_provider_error_is_kept() {
        let err = Error::AiProvider("quota exceeded".to_string()).classify();
        assert!(matches!(err, Error::AiProvider(_)));
    }

    #[test]
    fn test_validation_error_is_never_rewritten() {
        let err = Error::Validation("safety first".to_string()).classify();
        assert!(matches!(err, Error::Validation(_)));
    }
}
