//! Read-only catalog access.

use tracing::{debug, instrument};

use preciosa_core::{Category, Product, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::{ApiClient, ApiError};

/// Listing filter. `None` fields are not constrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Option<Category>,
    pub featured: Option<bool>,
}

impl CatalogFilter {
    /// Only products listed under `category`.
    #[must_use]
    pub const fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            featured: None,
        }
    }

    /// Whether `product` passes the filter.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.category.is_none_or(|c| c.matches(product.category))
            && self.featured.is_none_or(|f| f == product.featured)
    }

    /// Query parameters for the listing endpoint. `novidades` lists
    /// everything, so it adds no parameter.
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(category) = self.category.filter(|c| *c != Category::Novidades) {
            query.push(("categoria", category.slug().to_string()));
        }
        if let Some(featured) = self.featured {
            query.push(("destaque", featured.to_string()));
        }
        query
    }
}

/// Apply `filter` to an already fetched product list.
pub fn filter_products<'a>(
    products: &'a [Product],
    filter: &'a CatalogFilter,
) -> impl Iterator<Item = &'a Product> + 'a {
    products.iter().filter(move |p| filter.matches(p))
}

impl ApiClient {
    /// List products, optionally filtered by category and featured flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, filter: CatalogFilter) -> Result<Vec<Product>, ApiError> {
        let cache_key = CacheKey::Products {
            category: filter.category,
            featured: filter.featured,
        };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self.get_json("products", &filter.query(), None).await?;
        debug!(count = products.len(), "Fetched products");

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product by id.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` for an unknown id, or another error if the
    /// API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let path = format!("products/{}", urlencoding::encode(id.as_str()));
        let product: Product = self
            .get_json(&path, &[], None)
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::NotFound(format!("Product not found: {id}")),
                other => other,
            })?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}
