//! The assembled storefront client.
//!
//! Ties the services together over one shared storage handle and API client.
//! Cheaply cloneable; clones share all state.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use mercadito_core::{CityId, Customer, Order, OrderDraft, OrderDraftLine};

use crate::api::ApiClient;
use crate::auth::AuthSession;
use crate::cart::CartStore;
use crate::catalog::CatalogService;
use crate::cities::CityService;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::orders::OrderService;
use crate::storage::{FileStorage, Storage, StorageError};

const STORAGE_FILE: &str = "storage.json";

/// Error assembling a [`Storefront`].
#[derive(Debug, Error)]
pub enum InitError {
    #[error("failed to open durable storage: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to build API client: {0}")]
    Api(#[from] ApiError),
}

/// The assembled client: catalog, cart, auth, orders, and cities over one
/// shared storage handle.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    config: ClientConfig,
    catalog: CatalogService,
    cart: CartStore,
    auth: AuthSession,
    orders: OrderService,
    cities: CityService,
}

impl Storefront {
    /// Assemble a client with file-backed storage under the configured data
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be opened or the HTTP
    /// client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, InitError> {
        let storage: Arc<dyn Storage> =
            Arc::new(FileStorage::open(config.data_dir.join(STORAGE_FILE))?);
        Self::with_storage(config, storage)
    }

    /// Assemble a client over a caller-supplied storage implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: &ClientConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, InitError> {
        let api = ApiClient::new(config, Arc::clone(&storage))?;

        Ok(Self {
            inner: Arc::new(StorefrontInner {
                config: config.clone(),
                catalog: CatalogService::new(api.clone(), config),
                cart: CartStore::new(Arc::clone(&storage)),
                auth: AuthSession::new(api.clone(), Arc::clone(&storage)),
                orders: OrderService::new(api.clone()),
                cities: CityService::new(api),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn auth(&self) -> &AuthSession {
        &self.inner.auth
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }

    #[must_use]
    pub fn cities(&self) -> &CityService {
        &self.inner.cities
    }

    /// One-shot checkout: submit the current cart as an order, then clear the
    /// cart. The cart is left untouched when the submission fails.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] for an empty cart, and propagates the
    /// submission error otherwise.
    #[instrument(skip(self, customer, note))]
    pub async fn checkout(
        &self,
        city: CityId,
        customer: Customer,
        note: Option<String>,
    ) -> Result<Order, ApiError> {
        let items = self.inner.cart.items();
        if items.is_empty() {
            return Err(ApiError::Rejected("cart is empty".to_string()));
        }

        let draft = OrderDraft {
            city,
            customer,
            products: items
                .iter()
                .map(|item| OrderDraftLine {
                    product_id: item.product.id.clone(),
                    quantity: item.quantity,
                })
                .collect(),
            note,
        };

        let order = self.inner.orders.create(&draft).await?;
        self.inner.cart.clear();
        Ok(order)
    }
}
