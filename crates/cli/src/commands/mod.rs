//! CLI subcommands.
//!
//! Each module maps one group of subcommands onto `AppState` calls and
//! prints the outcome.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod orders;

use preciosa_core::{Price, PriceTier, Product};
use preciosa_storefront::AppState;

/// Shown in place of prices while they are gated.
pub const PRICES_HIDDEN: &str = "Entre para ver os preços";

/// Price text for `product`, honoring price gating.
fn price_label(state: &AppState, product: &Product, tier: PriceTier) -> String {
    state
        .visible_price(product, tier)
        .map_or_else(|| PRICES_HIDDEN.to_string(), |price: Price| price.to_string())
}
