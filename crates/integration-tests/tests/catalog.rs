//! Catalog queries and caching.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use preciosa_core::{Category, ProductId};
use preciosa_integration_tests::FakeBackend;
use preciosa_storefront::backend::{ApiError, CatalogFilter};
use preciosa_storefront::config::CheckoutPolicy;

#[tokio::test]
async fn test_filters_become_query_parameters() {
    let backend = FakeBackend::start().await.unwrap();
    let state = backend.state(CheckoutPolicy::GuestAllowed).unwrap();

    let vestidos = state
        .api()
        .list_products(CatalogFilter::category(Category::Vestidos))
        .await
        .unwrap();
    assert_eq!(vestidos.len(), 1);
    assert_eq!(vestidos[0].name, "Vestido Aurora");

    let featured = state
        .api()
        .list_products(CatalogFilter {
            category: None,
            featured: Some(true),
        })
        .await
        .unwrap();
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].id, ProductId::new("P001"));

    let all = state
        .api()
        .list_products(CatalogFilter::category(Category::Novidades))
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(!all[2].available);

    let queries: Vec<Option<String>> = backend
        .requests_to("/api/products")
        .into_iter()
        .map(|r| r.query)
        .collect();
    assert_eq!(
        queries,
        vec![
            Some("categoria=vestidos".to_string()),
            Some("destaque=true".to_string()),
            None,
        ]
    );
}

#[tokio::test]
async fn test_products_are_cached() {
    let backend = FakeBackend::start().await.unwrap();
    let state = backend.state(CheckoutPolicy::GuestAllowed).unwrap();
    let id = ProductId::new("P001");

    let first = state.api().get_product(&id).await.unwrap();
    let second = state.api().get_product(&id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(backend.requests_to("/api/products/P001").len(), 1);

    state.api().invalidate_cache();
    state.api().get_product(&id).await.unwrap();
    assert_eq!(backend.requests_to("/api/products/P001").len(), 2);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let backend = FakeBackend::start().await.unwrap();
    let state = backend.state(CheckoutPolicy::GuestAllowed).unwrap();

    let err = state
        .api()
        .get_product(&ProductId::new("P999"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
