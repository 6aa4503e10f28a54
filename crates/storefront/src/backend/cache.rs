//! Cache types for catalog responses.

use preciosa_core::{Category, Product, ProductId};

/// Cache key for products and product listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products {
        category: Option<Category>,
        featured: Option<bool>,
    },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}
