//! Catalog browsing.

use preciosa_core::{Category, PriceTier, ProductId};
use preciosa_storefront::AppState;
use preciosa_storefront::backend::CatalogFilter;

use super::price_label;

/// List products, optionally narrowed to a category or to featured items.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached.
pub async fn list(
    state: &AppState,
    category: Option<Category>,
    featured: bool,
) -> preciosa_storefront::Result<()> {
    let filter = CatalogFilter {
        category,
        featured: featured.then_some(true),
    };
    let products = state.api().list_products(filter).await?;

    if products.is_empty() {
        println!("Nenhum produto encontrado.");
        return Ok(());
    }

    for product in &products {
        let stock = if product.available { "" } else { " (esgotado)" };
        println!(
            "{:<8} {:<32} {:>14} {:>14}{stock}",
            product.id.as_str(),
            product.name,
            price_label(state, product, PriceTier::Wholesale),
            price_label(state, product, PriceTier::Retail),
        );
    }
    println!("\n{} produto(s)", products.len());
    Ok(())
}

/// Print one product in full.
///
/// # Errors
///
/// Returns an error if the product does not exist or the backend cannot be
/// reached.
pub async fn show(state: &AppState, id: &str) -> preciosa_storefront::Result<()> {
    let product = state.api().get_product(&ProductId::new(id)).await?;

    println!("{} ({})", product.name, product.id);
    if let Some(sku) = &product.sku {
        println!("SKU: {sku}");
    }
    println!("Categoria: {}", product.category.display_name());
    println!(
        "Atacado: {}",
        price_label(state, &product, PriceTier::Wholesale)
    );
    println!("Varejo: {}", price_label(state, &product, PriceTier::Retail));
    if !product.sizes.is_empty() {
        println!("Tamanhos: {}", product.sizes.join(", "));
    }
    if !product.colors.is_empty() {
        println!("Cores: {}", product.colors.join(", "));
    }
    println!("Estoque: {}", product.stock);
    if let Some(image) = product.primary_image() {
        println!("Imagem: {image}");
    }
    if !product.caption.trim().is_empty() {
        println!("\n{}", product.caption.trim());
    }
    Ok(())
}
