//! Checkout and order-management commands.

use tracing::info;

use mercadito_client::Storefront;
use mercadito_client::orders::OrderFilter;
use mercadito_core::{CityId, Customer, OrderId, OrderStatus};

fn parse_status(raw: &str) -> Result<OrderStatus, Box<dyn std::error::Error>> {
    match raw.to_uppercase().as_str() {
        "PENDING" => Ok(OrderStatus::Pending),
        "APPROVED" => Ok(OrderStatus::Approved),
        "REJECTED" => Ok(OrderStatus::Rejected),
        "CANCELLED" => Ok(OrderStatus::Cancelled),
        other => Err(format!("unknown order status: {other}").into()),
    }
}

/// Submit the current cart as an order and clear it on success.
///
/// # Errors
///
/// Returns an error if the cart is empty or the submission fails.
pub async fn checkout(
    storefront: &Storefront,
    city: String,
    name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    note: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let order = storefront
        .checkout(
            CityId::new(city),
            Customer {
                name,
                email,
                phone,
                address,
            },
            note,
        )
        .await?;

    info!(
        "order {} placed, total ${} ({})",
        order.order_number, order.total, order.status
    );
    Ok(())
}

/// List orders, optionally filtered by status.
///
/// # Errors
///
/// Returns an error if the status string is invalid or the request fails.
pub async fn list(
    storefront: &Storefront,
    status: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = OrderFilter {
        status: status.map(parse_status).transpose()?,
        ..OrderFilter::default()
    };

    let orders = storefront.orders().list(&filter).await?;
    info!("{} orders", orders.len());
    for order in orders {
        info!(
            "  {}  {}  {}  ${}  {}",
            order.id, order.order_number, order.order_date, order.total, order.status
        );
    }
    Ok(())
}

/// Show one order with its lines.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn show(storefront: &Storefront, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let detail = storefront.orders().get(&OrderId::new(id)).await?;

    info!(
        "order {}  {}  {}",
        detail.order.order_number, detail.order.status, detail.order.customer.name
    );
    for line in &detail.lines {
        info!(
            "  {}  {} x ${} = ${}",
            line.product_name, line.quantity, line.unit_price, line.subtotal
        );
    }
    info!("total ${}", detail.order.total);
    Ok(())
}

/// Approve a pending order.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn approve(
    storefront: &Storefront,
    id: &str,
    note: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let order = storefront.orders().approve(&OrderId::new(id), note).await?;
    info!("order {} approved", order.order_number);
    Ok(())
}

/// Reject a pending order with a reason.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn reject(
    storefront: &Storefront,
    id: &str,
    reason: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let order = storefront.orders().reject(&OrderId::new(id), reason).await?;
    info!("order {} rejected", order.order_number);
    Ok(())
}

/// Delete an unapproved order.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn delete(
    storefront: &Storefront,
    id: &str,
    reason: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    storefront.orders().delete(&OrderId::new(id), reason).await?;
    info!("order {id} deleted");
    Ok(())
}

/// Show aggregate order statistics.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn stats(storefront: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let stats = storefront.orders().stats().await?;
    info!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
