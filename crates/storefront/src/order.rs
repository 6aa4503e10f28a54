//! Order records built from the cart.
//!
//! An order is a frozen copy of the cart at submission time: line prices
//! are resolved once, with each line's own tier, and never recomputed.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use preciosa_core::{
    Document, Email, OrderId, OrderStatus, PaymentMethod, Phone, Price, PriceTier, ProductId,
    UserId,
};

use crate::cart::{CartLine, CartStore};
use crate::config::CheckoutPolicy;
use crate::models::{Session, UserProfile};
use crate::storage::{self, SharedStorage, StorageError, keys};

/// Channel recorded on every order placed by the storefront.
pub const WHATSAPP_CHANNEL: &str = "whatsapp";

/// Reasons an order cannot be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("a logged-in buyer is required to place orders")]
    LoginRequired,
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    /// Product SKU, or its id for products without one.
    #[serde(default)]
    pub sku: String,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(rename = "qty", alias = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "price", alias = "preco_unitario")]
    pub unit_price: Price,
    #[serde(default, rename = "tipo")]
    pub tier: PriceTier,
}

impl OrderLine {
    /// `quantity * unit_price`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id.clone(),
            sku: line
                .product
                .sku
                .clone()
                .unwrap_or_else(|| line.product.id.to_string()),
            name: line.product.name.clone(),
            quantity: line.quantity.get(),
            unit_price: line.unit_price(),
            tier: line.tier,
        }
    }
}

/// Who placed the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    #[serde(default, rename = "user_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    #[serde(default, rename = "cpf_cnpj", skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    /// No session was attached.
    #[serde(default)]
    pub guest: bool,
}

impl Buyer {
    /// The identity used for orders placed without a session.
    #[must_use]
    pub fn guest() -> Self {
        Self {
            id: None,
            name: "Cliente".to_string(),
            email: None,
            phone: None,
            document: None,
            guest: true,
        }
    }
}

impl From<&UserProfile> for Buyer {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id.clone(),
            name: profile.display_name().to_string(),
            email: profile.email.clone(),
            phone: profile.phone.clone(),
            document: profile.document.clone(),
            guest: false,
        }
    }
}

/// The record handed to the order endpoint and kept in local history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Client-side id; the backend assigns its own.
    pub id: OrderId,
    pub items: Vec<OrderLine>,
    pub total: Price,
    #[serde(rename = "user")]
    pub buyer: Buyer,
    /// Epoch milliseconds on the wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    pub channel: String,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
}

impl OrderRequest {
    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Snapshot the cart into an order.
///
/// Without a session the buyer is a guest, which `policy` may forbid.
///
/// # Errors
///
/// Returns `OrderError::EmptyCart` for an empty cart and
/// `OrderError::LoginRequired` when a session is needed but absent.
pub fn build_order(
    cart: &CartStore,
    session: Option<&Session>,
    policy: CheckoutPolicy,
    payment_method: PaymentMethod,
) -> Result<OrderRequest, OrderError> {
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let buyer = match session {
        Some(session) => Buyer::from(&session.profile),
        None if policy.is_gated() => return Err(OrderError::LoginRequired),
        None => Buyer::guest(),
    };

    let order = OrderRequest {
        id: OrderId::new(uuid::Uuid::new_v4().to_string()),
        items: cart.lines().iter().map(OrderLine::from).collect(),
        total: cart.total(),
        buyer,
        created_at: Utc::now().trunc_subsecs(3),
        channel: WHATSAPP_CHANNEL.to_string(),
        payment_method,
        status: OrderStatus::Pending,
    };

    debug!(
        order_id = %order.id,
        lines = order.items.len(),
        total = %order.total,
        guest = order.buyer.guest,
        "Order built"
    );

    Ok(order)
}

// =============================================================================
// OrderHistory
// =============================================================================

/// The buyer's "my orders" list, kept locally.
///
/// Append-only and bounded: once `limit` entries exist, recording a new
/// order drops the oldest. It is a cache of what this device submitted and
/// may disagree with the backend.
#[derive(Clone)]
pub struct OrderHistory {
    storage: SharedStorage,
    limit: usize,
}

impl std::fmt::Debug for OrderHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderHistory")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl OrderHistory {
    /// History over `storage`, keeping at most `limit` orders (minimum 1).
    #[must_use]
    pub fn new(storage: SharedStorage, limit: usize) -> Self {
        Self {
            storage,
            limit: limit.max(1),
        }
    }

    /// Stored orders, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<OrderRequest> {
        storage::load_or_default(self.storage.as_ref(), keys::ORDERS)
    }

    /// Stored orders, newest first.
    #[must_use]
    pub fn recent(&self) -> Vec<OrderRequest> {
        let mut entries = self.entries();
        entries.reverse();
        entries
    }

    /// Append `order`, evicting the oldest entries beyond the limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be written.
    pub fn record(&self, order: &OrderRequest) -> Result<(), StorageError> {
        let mut entries = self.entries();
        entries.push(order.clone());
        let excess = entries.len().saturating_sub(self.limit);
        entries.drain(..excess);

        storage::save(self.storage.as_ref(), keys::ORDERS, &entries)?;
        debug!(order_id = %order.id, stored = entries.len(), "Order recorded locally");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;

    use super::*;
    use crate::cart::tests::product;
    use crate::models::SessionOrigin;
    use crate::storage::MemoryStorage;

    fn filled_cart() -> CartStore {
        let mut cart = CartStore::load(Arc::new(MemoryStorage::new()));
        cart.add(&product("P001", 4000, 4500), PriceTier::Wholesale, 2)
            .unwrap();
        cart.add(&product("P003", 9500, 12_000), PriceTier::Retail, 1)
            .unwrap();
        cart
    }

    fn session() -> Session {
        Session {
            profile: UserProfile {
                id: Some(UserId::new("u-9")),
                name: "Ana".into(),
                email: Some(Email::parse("ana@example.com").unwrap()),
                phone: None,
                document: None,
                tier: PriceTier::Wholesale,
            },
            token: SecretString::from("tok"),
            origin: SessionOrigin::Remote,
        }
    }

    #[test]
    fn test_build_order_snapshots_lines() {
        let cart = filled_cart();
        let session = session();
        let order = build_order(
            &cart,
            Some(&session),
            CheckoutPolicy::SessionRequired,
            PaymentMethod::Pix,
        )
        .unwrap();

        assert_eq!(order.total, cart.total());
        assert_eq!(order.total, Price::from_cents(20_000));
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].sku, "PM-P001");
        assert_eq!(order.items[0].unit_price, Price::from_cents(4000));
        assert_eq!(order.items[1].unit_price, Price::from_cents(12_000));
        assert_eq!(order.item_count(), 3);
        assert_eq!(order.buyer.name, "Ana");
        assert!(!order.buyer.guest);
        assert_eq!(order.channel, "whatsapp");
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_guest_checkout_policy() {
        let cart = filled_cart();
        let order =
            build_order(&cart, None, CheckoutPolicy::GuestAllowed, PaymentMethod::Boleto).unwrap();
        assert!(order.buyer.guest);

        let err = build_order(&cart, None, CheckoutPolicy::SessionRequired, PaymentMethod::Pix);
        assert_eq!(err.unwrap_err(), OrderError::LoginRequired);
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let cart = CartStore::load(Arc::new(MemoryStorage::new()));
        let err = build_order(&cart, None, CheckoutPolicy::GuestAllowed, PaymentMethod::Pix);
        assert_eq!(err.unwrap_err(), OrderError::EmptyCart);
    }

    #[test]
    fn test_wire_shape() {
        let cart = filled_cart();
        let order =
            build_order(&cart, None, CheckoutPolicy::GuestAllowed, PaymentMethod::Card).unwrap();
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["items"][0]["qty"], 2);
        assert_eq!(json["items"][0]["price"], 40.0);
        assert_eq!(json["items"][0]["product_id"], "P001");
        assert_eq!(json["total"], 200.0);
        assert_eq!(json["channel"], "whatsapp");
        assert_eq!(json["payment_method"], "cartao");
        assert_eq!(json["status"], "pendente");
        assert_eq!(json["created_at"], order.created_at.timestamp_millis());
        assert_eq!(json["user"]["guest"], true);

        let back: OrderRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, order);
    }

    #[test]
    fn test_recorded_order_reads_back_equal() {
        let history = OrderHistory::new(Arc::new(MemoryStorage::new()), 5);
        let order = build_order(&filled_cart(), None, CheckoutPolicy::GuestAllowed, PaymentMethod::Pix)
            .unwrap();
        assert_eq!(order.created_at.timestamp_subsec_nanos() % 1_000_000, 0);

        history.record(&order).unwrap();
        assert_eq!(history.entries(), vec![order]);
    }

    #[test]
    fn test_history_is_bounded() {
        let storage = Arc::new(MemoryStorage::new());
        let history = OrderHistory::new(storage, 2);
        let cart = filled_cart();

        let ids: Vec<_> = (0..3)
            .map(|_| {
                let order =
                    build_order(&cart, None, CheckoutPolicy::GuestAllowed, PaymentMethod::Pix)
                        .unwrap();
                history.record(&order).unwrap();
                order.id
            })
            .collect();

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, ids[1]);
        assert_eq!(history.recent()[0].id, ids[2]);
    }

    #[test]
    fn test_corrupt_history_reads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage::save(storage.as_ref(), keys::ORDERS, "not a list").unwrap();
        assert!(OrderHistory::new(storage, 5).entries().is_empty());
    }
}
