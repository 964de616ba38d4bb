//! Local cart commands.
//!
//! `add` fetches the product first so the cart snapshot carries current
//! price and stock; the remaining commands are purely local.

use tracing::info;

use mercadito_client::Storefront;
use mercadito_core::ProductId;

/// Fetch a product and add it to the cart.
///
/// # Errors
///
/// Returns an error if the product lookup fails.
pub async fn add(
    storefront: &Storefront,
    product_id: &str,
    quantity: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let product = storefront
        .catalog()
        .product(&ProductId::new(product_id))
        .await?;

    storefront.cart().add_item(&product, quantity);
    info!("added {} x {}", quantity, product.name);
    list(storefront);
    Ok(())
}

/// Show the cart contents and totals.
pub fn list(storefront: &Storefront) {
    let items = storefront.cart().items();
    if items.is_empty() {
        info!("cart is empty");
        return;
    }

    for item in &items {
        info!(
            "  {}  {}  {} x ${} = ${}",
            item.product.id,
            item.product.name,
            item.quantity,
            item.product.price,
            item.subtotal()
        );
    }
    info!(
        "{} items, total ${}",
        storefront.cart().item_count(),
        storefront.cart().total()
    );
}

/// Set the quantity of a cart line.
pub fn set(storefront: &Storefront, product_id: &str, quantity: u32) {
    storefront
        .cart()
        .set_quantity(&ProductId::new(product_id), quantity);
    list(storefront);
}

/// Remove a product from the cart.
pub fn remove(storefront: &Storefront, product_id: &str) {
    storefront.cart().remove_item(&ProductId::new(product_id));
    list(storefront);
}

/// Empty the cart.
pub fn clear(storefront: &Storefront) {
    storefront.cart().clear();
    info!("cart cleared");
}
