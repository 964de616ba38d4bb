//! Catalog service: categories, subcategories, and products.
//!
//! Read lookups go through one [`LookupCache`] per resource family, each with
//! its own key space: category/subcategory lookups expire slowly (they change
//! rarely), product listings and details expire faster and are capacity
//! bounded. Admin mutations write through and invalidate every product cache
//! entry whose data could be stale, so subsequent reads refetch.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::instrument;

use mercadito_core::{
    Category, CategoryId, Pagination, Product, ProductCreate, ProductId, ProductUpdate,
    Subcategory, SubcategoryId,
};

use crate::api::ApiClient;
use crate::cache::LookupCache;
use crate::config::ClientConfig;
use crate::error::ApiError;

/// One page of a product listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Optional filters for product listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category: Option<CategoryId>,
    pub subcategory: Option<SubcategoryId>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ProductFilter {
    /// Render the filter as query parameters in stable (sorted) order, so
    /// equivalent filters produce identical URLs and cache keys.
    fn params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(category) = &self.category {
            params.insert("category".to_string(), category.to_string());
        }
        if let Some(subcategory) = &self.subcategory {
            params.insert("subcategory".to_string(), subcategory.to_string());
        }
        if let Some(search) = &self.search
            && !search.is_empty()
        {
            params.insert("search".to_string(), search.clone());
        }
        if let Some(min_price) = self.min_price {
            params.insert("minPrice".to_string(), min_price.to_string());
        }
        if let Some(max_price) = self.max_price {
            params.insert("maxPrice".to_string(), max_price.to_string());
        }
        params
    }
}

fn encode_params(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn as_pairs(params: &BTreeMap<String, String>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Cached access to the catalog endpoints.
#[derive(Clone)]
pub struct CatalogService {
    api: ApiClient,
    categories: LookupCache<Vec<Category>>,
    subcategories: LookupCache<Vec<Subcategory>>,
    listings: LookupCache<ProductPage>,
    details: LookupCache<Product>,
}

impl CatalogService {
    /// Create the service with cache TTLs and capacities from `config`.
    #[must_use]
    pub fn new(api: ApiClient, config: &ClientConfig) -> Self {
        Self {
            api,
            categories: LookupCache::new(config.category_ttl, config.category_cache_capacity),
            subcategories: LookupCache::new(config.category_ttl, config.category_cache_capacity),
            listings: LookupCache::new(config.product_ttl, config.product_cache_capacity),
            details: LookupCache::new(config.product_ttl, config.product_cache_capacity),
        }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// All active categories (cached).
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetch error; failures are not cached.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        let api = self.api.clone();
        self.categories
            .get_or_fetch("categories:all", async move {
                api.get_data("categories", &[]).await
            })
            .await
    }

    /// A single category by id (uncached; rarely on a hot path).
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetch error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn category(&self, id: &CategoryId) -> Result<Category, ApiError> {
        self.api.get_data(&format!("categories/{id}"), &[]).await
    }

    /// All active subcategories (cached).
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetch error; failures are not cached.
    #[instrument(skip(self))]
    pub async fn subcategories(&self) -> Result<Vec<Subcategory>, ApiError> {
        let api = self.api.clone();
        self.subcategories
            .get_or_fetch("subcategories:all", async move {
                api.get_data("subcategories", &[]).await
            })
            .await
    }

    /// Subcategories under one category (cached per category).
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetch error; failures are not cached.
    #[instrument(skip(self), fields(category = %category_id))]
    pub async fn subcategories_for(
        &self,
        category_id: &CategoryId,
    ) -> Result<Vec<Subcategory>, ApiError> {
        let api = self.api.clone();
        let path = format!("subcategories/category/{category_id}");
        self.subcategories
            .get_or_fetch(&format!("subcategories:category:{category_id}"), async move {
                api.get_data(&path, &[]).await
            })
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Product listing with filters (cached per filter combination).
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetch error; failures are not cached.
    #[instrument(skip(self, filter))]
    pub async fn products(&self, filter: &ProductFilter) -> Result<ProductPage, ApiError> {
        let params = filter.params();
        let key = listing_key("products", &params);
        let pairs = as_pairs(&params);
        let api = self.api.clone();
        self.listings
            .get_or_fetch(&key, async move {
                let (products, pagination) = api.get_page("products", &pairs).await?;
                Ok(ProductPage {
                    products,
                    pagination,
                })
            })
            .await
    }

    /// In-stock, active products, paginated (cached per page + filter).
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetch error; failures are not cached.
    #[instrument(skip(self, filter))]
    pub async fn available_products(
        &self,
        page: u32,
        limit: u32,
        filter: &ProductFilter,
    ) -> Result<ProductPage, ApiError> {
        let mut params = filter.params();
        params.insert("page".to_string(), page.to_string());
        params.insert("limit".to_string(), limit.to_string());
        let key = listing_key("available", &params);
        let pairs = as_pairs(&params);
        let api = self.api.clone();
        self.listings
            .get_or_fetch(&key, async move {
                let (products, pagination) = api.get_page("products/available", &pairs).await?;
                Ok(ProductPage {
                    products,
                    pagination,
                })
            })
            .await
    }

    /// Product detail by id (cached).
    ///
    /// # Errors
    ///
    /// Propagates the underlying fetch error; failures are not cached.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let api = self.api.clone();
        let path = format!("products/{id}");
        self.details
            .get_or_fetch(&format!("product:{id}"), async move {
                api.get_data(&path, &[]).await
            })
            .await
    }

    // =========================================================================
    // Admin Mutations (write-through with invalidation)
    // =========================================================================

    /// Create a product (admin/manager).
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, product))]
    pub async fn create_product(&self, product: &ProductCreate) -> Result<Product, ApiError> {
        let created = self.api.post_data("products", product).await?;
        self.invalidate_products();
        Ok(created)
    }

    /// Update a product (admin/manager).
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self, update), fields(id = %id))]
    pub async fn update_product(
        &self,
        id: &ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, ApiError> {
        let updated = self
            .api
            .put_data(&format!("products/{id}"), update)
            .await?;
        self.invalidate_products();
        Ok(updated)
    }

    /// Delete a product (admin/manager).
    ///
    /// # Errors
    ///
    /// Propagates the underlying request error.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), ApiError> {
        let _: serde_json::Value = self
            .api
            .delete_data(&format!("products/{id}"), None::<&()>)
            .await?;
        self.invalidate_products();
        Ok(())
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Drop every cached product listing and detail.
    pub fn invalidate_products(&self) {
        self.listings.invalidate_all();
        self.details.invalidate_all();
    }

    /// Drop one product detail plus all listings (which may include it).
    pub fn invalidate_product(&self, id: &ProductId) {
        self.details.invalidate(&format!("product:{id}"));
        self.listings.invalidate_all();
    }

    /// Drop every cached category and subcategory lookup.
    pub fn invalidate_categories(&self) {
        self.categories.invalidate_all();
        self.subcategories.invalidate_all();
    }
}

/// Deterministic cache key: prefix plus the sorted parameter encoding.
fn listing_key(prefix: &str, params: &BTreeMap<String, String>) -> String {
    format!("{prefix}:{}", encode_params(params))
}
