//! Catalog browsing commands.

use tracing::info;

use mercadito_client::Storefront;
use mercadito_client::catalog::ProductFilter;
use mercadito_core::{CategoryId, ProductId};

/// List active categories.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn categories(storefront: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let categories = storefront.catalog().categories().await?;
    info!("{} categories", categories.len());
    for category in categories {
        info!("  {}  {}", category.id, category.name);
    }
    Ok(())
}

/// List subcategories, optionally restricted to one category.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn subcategories(
    storefront: &Storefront,
    category: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let subcategories = match category {
        Some(id) => {
            storefront
                .catalog()
                .subcategories_for(&CategoryId::new(id))
                .await?
        }
        None => storefront.catalog().subcategories().await?,
    };
    info!("{} subcategories", subcategories.len());
    for subcategory in subcategories {
        info!("  {}  {}", subcategory.id, subcategory.name);
    }
    Ok(())
}

/// List available products.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn products(
    storefront: &Storefront,
    page: u32,
    limit: u32,
    category: Option<String>,
    search: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = ProductFilter {
        category: category.map(CategoryId::new),
        search,
        ..ProductFilter::default()
    };

    let listing = storefront
        .catalog()
        .available_products(page, limit, &filter)
        .await?;

    info!(
        "page {}/{} ({} products total)",
        listing.pagination.page, listing.pagination.total_pages, listing.pagination.total
    );
    for product in listing.products {
        info!(
            "  {}  {}  ${}  (stock {})",
            product.id, product.name, product.price, product.stock
        );
    }
    Ok(())
}

/// Show one product in detail.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn show(storefront: &Storefront, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let product = storefront.catalog().product(&ProductId::new(id)).await?;

    info!("{}  {}", product.id, product.name);
    info!("  price: ${}", product.price);
    info!("  stock: {}", product.stock);
    info!("  {}", product.description);
    if let Some(category) = product.category.as_full() {
        info!("  category: {}", category.name);
    }
    Ok(())
}

/// List delivery cities.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn cities(storefront: &Storefront) -> Result<(), Box<dyn std::error::Error>> {
    let cities = storefront.cities().list().await?;
    info!("{} cities", cities.len());
    for city in cities {
        info!("  {}  {}", city.id, city.name);
    }
    Ok(())
}
