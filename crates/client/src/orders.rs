//! Order service: checkout, history, and the admin approval flow.
//!
//! Orders are mutable state and are never cached.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::instrument;

use mercadito_core::{CityId, Order, OrderDetail, OrderDraft, OrderId, OrderStatus};

use crate::api::ApiClient;
use crate::error::ApiError;

/// Optional filters for order listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub city: Option<CityId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl OrderFilter {
    fn params(&self) -> Vec<(String, String)> {
        let mut params = BTreeMap::new();
        if let Some(status) = self.status {
            params.insert("status".to_string(), status.to_string());
        }
        if let Some(city) = &self.city {
            params.insert("city".to_string(), city.to_string());
        }
        if let Some(page) = self.page {
            params.insert("page".to_string(), page.to_string());
        }
        if let Some(limit) = self.limit {
            params.insert("limit".to_string(), limit.to_string());
        }
        params.into_iter().collect()
    }
}

#[derive(Debug, Serialize)]
struct ApproveBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ReasonBody<'a> {
    reason: &'a str,
}

/// Access to the order endpoints.
#[derive(Clone)]
pub struct OrderService {
    api: ApiClient,
}

impl OrderService {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// List orders matching `filter`.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, filter))]
    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, ApiError> {
        self.api.get_data("orders", &filter.params()).await
    }

    /// One order with its lines.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get(&self, id: &OrderId) -> Result<OrderDetail, ApiError> {
        self.api.get_data(&format!("orders/{id}"), &[]).await
    }

    /// Submit a checkout draft. The backend re-prices every line and returns
    /// the placed order; the caller clears the cart on success.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error (including stock rejections).
    #[instrument(skip(self, draft), fields(lines = draft.products.len()))]
    pub async fn create(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        self.api.post_data("orders", draft).await
    }

    /// Approve a pending order (admin/manager), with an optional note.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, note), fields(id = %id))]
    pub async fn approve(&self, id: &OrderId, note: Option<&str>) -> Result<Order, ApiError> {
        self.api
            .patch_data(&format!("orders/{id}/approve"), &ApproveBody { note })
            .await
    }

    /// Reject a pending order (admin/manager) with a reason.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, reason), fields(id = %id))]
    pub async fn reject(&self, id: &OrderId, reason: &str) -> Result<Order, ApiError> {
        self.api
            .patch_data(&format!("orders/{id}/reject"), &ReasonBody { reason })
            .await
    }

    /// Delete an order (admin/manager; the backend refuses approved orders).
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, reason), fields(id = %id))]
    pub async fn delete(&self, id: &OrderId, reason: Option<&str>) -> Result<(), ApiError> {
        let body = reason.map(|reason| ReasonBody { reason });
        let _: serde_json::Value = self
            .api
            .delete_data(&format!("orders/{id}"), body.as_ref())
            .await?;
        Ok(())
    }

    /// Aggregate order statistics for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<serde_json::Value, ApiError> {
        self.api.get_data("orders/stats/summary", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_params_sorted_and_complete() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Pending),
            city: Some(CityId::new("c9")),
            page: Some(2),
            limit: Some(20),
        };

        assert_eq!(
            filter.params(),
            vec![
                ("city".to_string(), "c9".to_string()),
                ("limit".to_string(), "20".to_string()),
                ("page".to_string(), "2".to_string()),
                ("status".to_string(), "PENDING".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_filter_has_no_params() {
        assert!(OrderFilter::default().params().is_empty());
    }

    #[test]
    fn test_approve_body_omits_absent_note() {
        let json = serde_json::to_value(ApproveBody { note: None }).expect("serialize");
        assert_eq!(json, serde_json::json!({}));

        let json = serde_json::to_value(ApproveBody {
            note: Some("verified payment"),
        })
        .expect("serialize");
        assert_eq!(json, serde_json::json!({"note": "verified payment"}));
    }
}
