//! The backend's uniform response envelope.
//!
//! Every REST endpoint wraps its payload in the same JSON shape:
//!
//! ```json
//! { "success": true, "message": "...", "data": ..., "pagination": { ... } }
//! ```
//!
//! The envelope shape is a fixed external contract; callers only ever consume
//! `data` (and `pagination` for list results).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error unwrapping an [`Envelope`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The backend reported `success: false`.
    #[error("request rejected by backend: {0}")]
    Rejected(String),

    /// The backend reported success but the payload was absent.
    #[error("response envelope has no data")]
    MissingData,
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of matching records.
    pub total: u64,
    /// Current page (1-based).
    pub page: u32,
    /// Page size requested.
    pub limit: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total: 0,
            page: 1,
            limit: 10,
            total_pages: 0,
        }
    }
}

/// Uniform response wrapper returned by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    /// Whether the backend considered the request successful.
    pub success: bool,
    /// Human-readable status message.
    #[serde(default)]
    pub message: Option<String>,
    /// The wrapped payload; absent on failure responses.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    /// Pagination metadata, present on paginated list responses.
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl<T> Envelope<T> {
    /// Unwrap the payload, turning backend-reported failure into an error.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Rejected`] when `success` is false and
    /// [`EnvelopeError::MissingData`] when a successful response carries no
    /// payload.
    pub fn into_data(self) -> Result<T, EnvelopeError> {
        if !self.success {
            return Err(EnvelopeError::Rejected(
                self.message
                    .unwrap_or_else(|| "unspecified backend error".to_string()),
            ));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }

    /// Unwrap the payload together with its pagination metadata.
    ///
    /// Missing pagination falls back to [`Pagination::default`]; some list
    /// endpoints omit it for empty result sets.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::into_data`].
    pub fn into_page(self) -> Result<(T, Pagination), EnvelopeError> {
        let pagination = self.pagination.unwrap_or_default();
        Ok((self.into_data()?, pagination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success_unwraps_data() {
        let envelope: Envelope<Vec<i32>> = serde_json::from_str(
            r#"{"success": true, "message": "ok", "data": [1, 2, 3]}"#,
        )
        .expect("deserialize");

        assert_eq!(envelope.into_data().expect("data"), vec![1, 2, 3]);
    }

    #[test]
    fn test_envelope_failure_carries_message() {
        let envelope: Envelope<Vec<i32>> = serde_json::from_str(
            r#"{"success": false, "message": "product out of stock"}"#,
        )
        .expect("deserialize");

        assert_eq!(
            envelope.into_data(),
            Err(EnvelopeError::Rejected("product out of stock".to_string()))
        );
    }

    #[test]
    fn test_envelope_success_without_data() {
        let envelope: Envelope<i32> =
            serde_json::from_str(r#"{"success": true}"#).expect("deserialize");
        assert_eq!(envelope.into_data(), Err(EnvelopeError::MissingData));
    }

    #[test]
    fn test_envelope_pagination_round_trip() {
        let envelope: Envelope<Vec<i32>> = serde_json::from_str(
            r#"{
                "success": true,
                "data": [1],
                "pagination": {"total": 41, "page": 2, "limit": 12, "totalPages": 4}
            }"#,
        )
        .expect("deserialize");

        let (data, pagination) = envelope.into_page().expect("page");
        assert_eq!(data, vec![1]);
        assert_eq!(pagination.total, 41);
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.limit, 12);
        assert_eq!(pagination.total_pages, 4);
    }

    #[test]
    fn test_envelope_missing_pagination_defaults() {
        let envelope: Envelope<Vec<i32>> =
            serde_json::from_str(r#"{"success": true, "data": []}"#).expect("deserialize");

        let (_, pagination) = envelope.into_page().expect("page");
        assert_eq!(pagination, Pagination::default());
    }
}
