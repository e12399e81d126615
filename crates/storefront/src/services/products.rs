//! Product catalogue.
//!
//! Featured products are read cache-aside through the key-value cache; every
//! admin mutation invalidates that entry so the next read reloads it.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

use mercato_core::ProductId;

use crate::cache::{CacheError, CacheKey, KeyValueCache};
use crate::db::{ProductStore, RepositoryError};
use crate::models::{MAX_PRICE, NewProduct, Product};

/// How many products a recommendation request returns.
pub const RECOMMENDATION_COUNT: usize = 4;

/// Errors from catalogue operations.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product {0} not found")]
    NotFound(ProductId),

    /// A create request failed field validation.
    #[error("{0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Catalogue operations for one request.
pub struct ProductService<'a> {
    products: &'a dyn ProductStore,
    cache: &'a dyn KeyValueCache,
    featured_ttl: Option<Duration>,
}

impl<'a> ProductService<'a> {
    #[must_use]
    pub const fn new(
        products: &'a dyn ProductStore,
        cache: &'a dyn KeyValueCache,
        featured_ttl: Option<Duration>,
    ) -> Self {
        Self {
            products,
            cache,
            featured_ttl,
        }
    }

    /// Every product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, ProductError> {
        Ok(self.products.list_all().await?)
    }

    /// Products in one category.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the query fails.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Product>, ProductError> {
        Ok(self.products.list_by_category(category).await?)
    }

    /// A random handful of products.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Repository` if the query fails.
    pub async fn recommendations(&self) -> Result<Vec<Product>, ProductError> {
        Ok(self.products.sample(RECOMMENDATION_COUNT).await?)
    }

    /// Featured products, served from the cache when present.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Cache` or `ProductError::Repository` if either
    /// backend fails.
    pub async fn featured(&self) -> Result<Vec<Product>, ProductError> {
        let key = CacheKey::FeaturedProducts;

        if let Some(cached) = self.cache.get(&key).await? {
            match serde_json::from_str::<Vec<Product>>(&cached) {
                Ok(products) => {
                    debug!(count = products.len(), "Cache hit for featured products");
                    return Ok(products);
                }
                Err(e) => warn!(error = %e, "Discarding unreadable featured products cache entry"),
            }
        }

        let products = self.products.list_featured().await?;
        let encoded = serde_json::to_string(&products)?;
        self.cache.set(&key, encoded, self.featured_ttl).await?;
        Ok(products)
    }

    /// Add a product. New products are not featured.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::Invalid` if a field is blank or the price is negative.
    pub async fn create(&self, product: NewProduct) -> Result<Product, ProductError> {
        validate_new_product(&product)?;
        let created = self.products.create(product).await?;
        self.invalidate_featured().await?;
        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    /// Flip a product's featured flag.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for an unknown product.
    pub async fn toggle_featured(&self, id: ProductId) -> Result<Product, ProductError> {
        let product = self
            .products
            .toggle_featured(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;
        self.invalidate_featured().await?;
        info!(product_id = %id, featured = product.is_featured, "Product featured flag toggled");
        Ok(product)
    }

    /// Remove a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::NotFound` for an unknown product.
    pub async fn delete(&self, id: ProductId) -> Result<(), ProductError> {
        if !self.products.delete(id).await? {
            return Err(ProductError::NotFound(id));
        }
        self.invalidate_featured().await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn invalidate_featured(&self) -> Result<(), ProductError> {
        self.cache.invalidate(&CacheKey::FeaturedProducts).await?;
        Ok(())
    }
}

fn validate_new_product(product: &NewProduct) -> Result<(), ProductError> {
    for (field, value) in [
        ("name", &product.name),
        ("description", &product.description),
        ("image", &product.image),
        ("category", &product.category),
    ] {
        if value.trim().is_empty() {
            return Err(ProductError::Invalid(format!("{field} is required")));
        }
    }
    if product.price < Decimal::ZERO {
        return Err(ProductError::Invalid("price cannot be negative".to_owned()));
    }
    if product.price > MAX_PRICE {
        return Err(ProductError::Invalid(format!("price cannot exceed {MAX_PRICE}")));
    }
    Ok(())
}
