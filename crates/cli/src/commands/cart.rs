//! Cart editing.
//!
//! The cart lives in the data directory, so every invocation picks up where
//! the previous one left off.

use preciosa_core::{PriceTier, ProductId};
use preciosa_storefront::AppState;

/// Fetch `id` from the catalog and add it.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched, prices are gated, or
/// the cart rejects the quantity.
pub async fn add(
    state: &mut AppState,
    id: &str,
    tier: Option<PriceTier>,
    quantity: u32,
) -> preciosa_storefront::Result<()> {
    let product = state.api().get_product(&ProductId::new(id)).await?;
    state.add_to_cart(&product, tier, quantity)?;
    println!("{quantity}x {} adicionado ao carrinho.", product.name);
    show(state);
    Ok(())
}

/// # Errors
///
/// Returns an error if prices are gated or the cart cannot be saved.
pub fn increment(
    state: &mut AppState,
    id: &str,
    tier: PriceTier,
) -> preciosa_storefront::Result<()> {
    state.increment(&ProductId::new(id), tier)?;
    show(state);
    Ok(())
}

/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn decrement(
    state: &mut AppState,
    id: &str,
    tier: PriceTier,
) -> preciosa_storefront::Result<()> {
    state.decrement(&ProductId::new(id), tier)?;
    show(state);
    Ok(())
}

/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn remove(state: &mut AppState, id: &str, tier: PriceTier) -> preciosa_storefront::Result<()> {
    state.remove(&ProductId::new(id), tier)?;
    show(state);
    Ok(())
}

/// # Errors
///
/// Returns an error if the cart cannot be saved.
pub fn clear(state: &mut AppState) -> preciosa_storefront::Result<()> {
    state.clear_cart()?;
    println!("Carrinho esvaziado.");
    Ok(())
}

/// Print the cart lines and total.
pub fn show(state: &AppState) {
    let cart = state.cart();
    if cart.is_empty() {
        println!("Seu carrinho está vazio.");
        return;
    }

    for line in cart.lines() {
        println!(
            "{:<8} {:<32} {:<8} {:>3}x {:>12} = {:>12}",
            line.product.id.as_str(),
            line.product.name,
            line.tier.label(),
            line.quantity,
            line.unit_price().to_string(),
            line.subtotal().to_string(),
        );
    }
    println!("{} peça(s), total {}", cart.count(), cart.total());
}
