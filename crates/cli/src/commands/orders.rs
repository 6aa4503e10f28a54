//! Checkout, order history and caption sharing.

use preciosa_core::{PaymentMethod, PriceTier, ProductId};
use preciosa_storefront::AppState;
use preciosa_storefront::backend::BestEffortExt;

use crate::platform::{SystemClipboard, SystemOpener};

/// Submit the cart and open the WhatsApp conversation.
///
/// # Errors
///
/// Returns an error if the cart is empty, login is required, or the cart
/// could not be cleared after submission.
pub async fn checkout(
    state: &mut AppState,
    payment_method: PaymentMethod,
) -> preciosa_storefront::Result<()> {
    let receipt = state.checkout(payment_method, &SystemOpener).await?;

    println!(
        "Pedido {} enviado: {} peça(s), total {} ({}).",
        receipt.remote.value(),
        receipt.order.item_count(),
        receipt.order.total,
        receipt.order.payment_method,
    );
    if !receipt.remote.is_remote() {
        println!("O servidor não respondeu; o pedido ficou salvo neste dispositivo.");
    }
    if !receipt.saved_locally {
        println!("Não foi possível salvar o pedido no histórico local.");
    }
    if !receipt.link_opened {
        println!("Abra este link para finalizar no WhatsApp:");
    }
    println!("{}", receipt.link);
    Ok(())
}

/// List orders from local history, or from the backend with `remote`.
///
/// # Errors
///
/// Returns an error if `remote` is set without a remote session, or the
/// backend cannot be reached.
pub async fn list(state: &AppState, remote: bool) -> preciosa_storefront::Result<()> {
    if remote {
        let orders = state.remote_orders().await?;
        if orders.is_empty() {
            println!("Nenhum pedido encontrado.");
        }
        for order in &orders {
            let created = order
                .created_at
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            println!(
                "{:<24} {:<16} {:>14} {:<10} {}",
                order.id.as_str(),
                created,
                order.total.to_string(),
                order.status.to_string(),
                order.payment_method.map(|m| m.to_string()).unwrap_or_default(),
            );
        }
        return Ok(());
    }

    let orders = state.history().recent();
    if orders.is_empty() {
        println!("Nenhum pedido neste dispositivo.");
    }
    for order in &orders {
        println!(
            "{:<24} {:<16} {:>4} peça(s) {:>14} {:<10} {}",
            order.id.as_str(),
            order.created_at.format("%d/%m/%Y %H:%M").to_string(),
            order.item_count(),
            order.total.to_string(),
            order.status.to_string(),
            order.payment_method,
        );
    }
    Ok(())
}

/// Copy a product caption to the clipboard.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn caption(
    state: &AppState,
    id: &str,
    tier: Option<PriceTier>,
) -> preciosa_storefront::Result<()> {
    let product = state.api().get_product(&ProductId::new(id)).await?;
    let tier = tier.unwrap_or_else(|| state.default_tier());

    let notice = state.share_caption(&product, tier, &mut SystemClipboard);
    println!("{}\n\n{notice}", state.caption(&product, tier));
    Ok(())
}
