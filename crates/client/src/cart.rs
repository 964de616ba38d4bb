//! Locally persisted shopping cart with observable state.
//!
//! The cart lives entirely on the client until checkout: an ordered sequence
//! of (product snapshot, quantity) pairs. Every mutation runs as one
//! synchronous read-then-write under the state lock (no suspension point in
//! between), persists the full serialized sequence to durable storage, and
//! republishes the full sequence to all subscribers. Consumers treat the
//! published sequence as the sole source of truth; there are no delta
//! notifications.
//!
//! Quantities are invariants, not errors: every operation clamps to
//! `1..=stock` instead of failing.

use std::sync::{Arc, Mutex, PoisonError};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::warn;

use mercadito_core::{Product, ProductId, ProductSnapshot};

use crate::storage::{Storage, keys};

/// One cart line: a product snapshot and how many of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// Snapshot taken when the product entered the cart; later server-side
    /// stock or price changes are not reflected here.
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl CartItem {
    /// Line subtotal at snapshot prices.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Client-local shopping cart, persisted on every mutation.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    items: Mutex<Vec<CartItem>>,
    publisher: watch::Sender<Vec<CartItem>>,
}

impl CartStore {
    /// Rehydrate the cart from durable storage.
    ///
    /// A missing or corrupt persisted blob reads as an empty cart.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let items = storage
            .get(keys::CART_ITEMS)
            .and_then(|raw| {
                serde_json::from_str::<Vec<CartItem>>(&raw)
                    .map_err(|e| {
                        warn!(error = %e, "persisted cart is corrupt, starting empty");
                        e
                    })
                    .ok()
            })
            .unwrap_or_default();

        let (publisher, _) = watch::channel(items.clone());

        Self {
            storage,
            items: Mutex::new(items),
            publisher,
        }
    }

    /// Add `quantity` of `product`, merging with an existing line for the
    /// same product id.
    ///
    /// Quantities clamp to the product's stock; a requested quantity of zero
    /// is treated as one. Adding a product with no stock is a no-op.
    pub fn add_item(&self, product: &Product, quantity: u32) {
        if product.stock == 0 {
            warn!(product = %product.id, "ignoring add of product with no stock");
            return;
        }
        let requested = quantity.max(1);

        self.mutate(|items| {
            if let Some(item) = items.iter_mut().find(|item| item.product.id == product.id) {
                // The caller just fetched the product, so clamp against the
                // fresher stock figure rather than the stored snapshot's.
                item.quantity = item.quantity.saturating_add(requested).min(product.stock);
            } else {
                items.push(CartItem {
                    product: ProductSnapshot::from(product),
                    quantity: requested.min(product.stock),
                });
            }
        });
    }

    /// Set the quantity of an existing line, clamped to `1..=stock`.
    ///
    /// No-op if the product is not in the cart.
    pub fn set_quantity(&self, product_id: &ProductId, quantity: u32) {
        self.mutate(|items| {
            if let Some(item) = items.iter_mut().find(|item| &item.product.id == product_id) {
                item.quantity = quantity.clamp(1, item.product.stock.max(1));
            }
        });
    }

    /// Remove the line for `product_id`; no-op if absent.
    pub fn remove_item(&self, product_id: &ProductId) {
        self.mutate(|items| {
            items.retain(|item| &item.product.id != product_id);
        });
    }

    /// Empty the cart (explicit "empty cart", or after successful checkout).
    pub fn clear(&self) {
        self.mutate(Vec::clear);
    }

    /// Current item sequence, in the order products were first added.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().clone()
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total price, recomputed from current state on every call.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lock().iter().map(CartItem::subtotal).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lock().iter().map(|item| item.quantity).sum()
    }

    /// Subscribe to the published item sequence.
    ///
    /// The receiver starts at the current state and sees the full sequence
    /// after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<CartItem>> {
        self.publisher.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CartItem>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one synchronous mutation, then persist and publish the full state.
    fn mutate(&self, op: impl FnOnce(&mut Vec<CartItem>)) {
        let mut items = self.lock();
        op(&mut items);
        self.persist(&items);
        self.publisher.send_replace(items.clone());
    }

    fn persist(&self, items: &[CartItem]) {
        match serde_json::to_string(items) {
            Ok(serialized) => self.storage.set(keys::CART_ITEMS, &serialized),
            Err(e) => warn!(error = %e, "failed to serialize cart for persistence"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use mercadito_core::{Category, Linked};

    fn product(id: &str, price: i64, stock: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::new(price, 0),
            stock,
            category: Linked::<Category>::Id("c1".to_string()),
            subcategory: None,
            images: vec![],
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn store() -> CartStore {
        CartStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_add_then_clamp_then_remove_scenario() {
        let cart = store();
        let p1 = product("p1", 10, 5);

        cart.add_item(&p1, 3);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.total(), Decimal::new(30, 0));

        // Re-adding merges and clamps to stock.
        cart.add_item(&p1, 10);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(cart.total(), Decimal::new(50, 0));

        cart.remove_item(&ProductId::new("p1"));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_repeated_adds_sum_to_min_of_stock() {
        let cart = store();
        let p = product("p1", 7, 4);

        for _ in 0..10 {
            cart.add_item(&p, 1);
        }

        let items = cart.items();
        assert_eq!(items.len(), 1, "one line per product id");
        assert_eq!(items[0].quantity, 4);
    }

    #[test]
    fn test_set_quantity_clamps_both_boundaries() {
        let cart = store();
        let p = product("p1", 10, 5);
        cart.add_item(&p, 2);

        cart.set_quantity(&ProductId::new("p1"), 0);
        assert_eq!(cart.items()[0].quantity, 1);

        cart.set_quantity(&ProductId::new("p1"), 99);
        assert_eq!(cart.items()[0].quantity, 5);

        cart.set_quantity(&ProductId::new("p1"), 3);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_set_quantity_absent_product_is_noop() {
        let cart = store();
        cart.set_quantity(&ProductId::new("ghost"), 3);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_zero_stock_add_is_noop() {
        let cart = store();
        cart.add_item(&product("p1", 10, 0), 2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_readd_after_remove_appends_at_end() {
        let cart = store();
        cart.add_item(&product("p1", 1, 9), 1);
        cart.add_item(&product("p2", 1, 9), 1);
        cart.add_item(&product("p3", 1, 9), 1);

        cart.remove_item(&ProductId::new("p1"));
        cart.add_item(&product("p1", 1, 9), 1);

        let order: Vec<String> = cart
            .items()
            .iter()
            .map(|item| item.product.id.to_string())
            .collect();
        assert_eq!(order, vec!["p2", "p3", "p1"]);
    }

    #[test]
    fn test_totals_recomputed_from_state() {
        let cart = store();
        cart.add_item(&product("p1", 10, 9), 2);
        cart.add_item(&product("p2", 3, 9), 4);

        assert_eq!(cart.total(), Decimal::new(32, 0));
        assert_eq!(cart.item_count(), 6);

        cart.set_quantity(&ProductId::new("p2"), 1);
        assert_eq!(cart.total(), Decimal::new(23, 0));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_cart_survives_restart_via_storage() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

        {
            let cart = CartStore::new(Arc::clone(&storage));
            cart.add_item(&product("p1", 10, 5), 2);
        }

        let cart = CartStore::new(storage);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_corrupt_persisted_cart_reads_as_empty() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        storage.set(keys::CART_ITEMS, "{definitely not a cart");

        let cart = CartStore::new(storage);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_full_state_on_every_mutation() {
        let cart = store();
        let mut rx = cart.subscribe();

        assert!(rx.borrow_and_update().is_empty());

        cart.add_item(&product("p1", 10, 5), 2);
        rx.changed().await.unwrap();
        {
            let published = rx.borrow_and_update();
            assert_eq!(published.len(), 1);
            assert_eq!(published[0].quantity, 2);
        }

        cart.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    #[test]
    fn test_late_subscriber_starts_at_current_state() {
        let cart = store();
        cart.add_item(&product("p1", 10, 5), 2);

        let mut rx = cart.subscribe();
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
