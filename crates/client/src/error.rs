//! Error taxonomy for backend interactions.
//!
//! [`ApiError`] is `Clone` on purpose: a cached lookup is shared by every
//! concurrent caller for the same key, so a failed fetch must be able to hand
//! the same error to all of its waiters. Source errors that do not implement
//! `Clone` (`reqwest::Error`, `serde_json::Error`) are captured as their
//! display strings at the conversion boundary.
//!
//! Local cart invariants (quantities out of range) are never errors; they are
//! clamped at the mutation site.

use mercadito_core::EnvelopeError;
use thiserror::Error;

/// Errors that can occur when talking to the Mercadito backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success HTTP status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered 200 but reported `success: false`.
    #[error("request rejected by backend: {0}")]
    Rejected(String),

    /// The response body could not be decoded as the expected envelope.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<EnvelopeError> for ApiError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Rejected(message) => Self::Rejected(message),
            EnvelopeError::MissingData => Self::Decode(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_rejection_maps_to_rejected() {
        let err: ApiError = EnvelopeError::Rejected("stock exhausted".to_string()).into();
        assert_eq!(err, ApiError::Rejected("stock exhausted".to_string()));
    }

    #[test]
    fn test_missing_data_maps_to_decode() {
        let err: ApiError = EnvelopeError::MissingData.into();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ApiError::Transport("connection refused".to_string()).is_transient());
        assert!(
            !ApiError::Status {
                status: 500,
                message: "boom".to_string()
            }
            .is_transient()
        );
    }
}
