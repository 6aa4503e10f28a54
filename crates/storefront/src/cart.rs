//! Shopping cart store.
//!
//! The cart is an ordered list of lines keyed by `(product, tier)`: adding a
//! pair that is already present increments its quantity instead of appending
//! a duplicate, and a line whose quantity would drop to zero is removed.
//!
//! Every mutation is written to durable storage before it becomes visible.
//! If the write fails the mutation is discarded and the error returned, so
//! memory and storage never disagree.
//!
//! # Price policy
//!
//! Each line carries its own tier, chosen when the product was added, and a
//! snapshot of the product's two prices taken at that moment. Totals are
//! computed from the snapshot: a later catalog price change does not affect
//! lines already in the cart. Switching the storefront's default tier never
//! re-tiers existing lines.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use preciosa_core::{Price, PriceResolver, PriceTier, Product, ProductId};

use crate::error::add_breadcrumb;
use crate::events::{CartEvent, Observers, SubscriptionId};
use crate::storage::{self, SharedStorage, StorageError, keys};

/// Errors returned by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantities must be positive integers.
    #[error("quantity must be a positive integer (got {0})")]
    InvalidQuantity(u32),

    /// The resulting quantity does not fit in a `u32`.
    #[error("quantity overflow for product {0}")]
    QuantityOverflow(ProductId),

    /// The line subtotal or the cart total would exceed the largest
    /// representable amount.
    #[error("cart total overflow adding product {0}")]
    TotalOverflow(ProductId),

    /// The cart could not be persisted; the mutation was discarded.
    #[error("failed to persist cart: {0}")]
    Storage(#[from] StorageError),
}

/// The product data a cart line keeps, captured when the line is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub wholesale_price: Price,
    pub retail_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            sku: product.sku.clone(),
            wholesale_price: product.wholesale_price,
            retail_price: product.retail_price,
            image: product.primary_image().map(str::to_owned),
        }
    }
}

impl PriceResolver for ProductSnapshot {
    fn wholesale_price(&self) -> Price {
        self.wholesale_price
    }

    fn retail_price(&self) -> Price {
        self.retail_price
    }
}

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductSnapshot,
    pub tier: PriceTier,
    pub quantity: NonZeroU32,
}

impl CartLine {
    /// Unit price under this line's own tier.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.product.price_for(self.tier)
    }

    /// `quantity * unit_price`.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.unit_price().times(self.quantity.get())
    }

    fn matches(&self, product_id: &ProductId, tier: PriceTier) -> bool {
        self.product.id == *product_id && self.tier == tier
    }
}

/// The cart, bound to a storage backend.
pub struct CartStore {
    storage: SharedStorage,
    lines: Vec<CartLine>,
    observers: Observers<CartEvent>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the cart persisted in `storage`.
    ///
    /// Missing or malformed data yields an empty cart, as does a stored cart
    /// whose total cannot be represented.
    #[must_use]
    pub fn load(storage: SharedStorage) -> Self {
        let stored: Vec<CartLine> = storage::load_or_default(storage.as_ref(), keys::CART);
        let mut lines = normalize(stored);
        if checked_total(&lines).is_none() {
            warn!(lines = lines.len(), "Stored cart total overflows, starting empty");
            lines.clear();
        }
        debug!(lines = lines.len(), "Cart restored");
        Self {
            storage,
            lines,
            observers: Observers::default(),
        }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `(product_id, tier)`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId, tier: PriceTier) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(product_id, tier))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of `quantity * unit price` over all lines, each at its own tier.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity.get())).sum()
    }

    /// Add `quantity` units of `product` at `tier`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for a zero quantity,
    /// `CartError::QuantityOverflow` if the line would overflow,
    /// `CartError::TotalOverflow` if the cart total would, and
    /// `CartError::Storage` if the cart cannot be persisted.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub fn add(
        &mut self,
        product: &Product,
        tier: PriceTier,
        quantity: u32,
    ) -> Result<(), CartError> {
        let quantity = NonZeroU32::new(quantity).ok_or(CartError::InvalidQuantity(quantity))?;
        let mut next = self.lines.clone();

        let event = if let Some(line) = next.iter_mut().find(|l| l.matches(&product.id, tier)) {
            line.quantity = line
                .quantity
                .checked_add(quantity.get())
                .ok_or_else(|| CartError::QuantityOverflow(product.id.clone()))?;
            CartEvent::QuantityChanged {
                product_id: product.id.clone(),
                tier,
                quantity: line.quantity.get(),
            }
        } else {
            next.push(CartLine {
                product: ProductSnapshot::from(product),
                tier,
                quantity,
            });
            CartEvent::LineAdded {
                product_id: product.id.clone(),
                tier,
                quantity: quantity.get(),
            }
        };

        if checked_total(&next).is_none() {
            return Err(CartError::TotalOverflow(product.id.clone()));
        }
        self.commit(next, event)
    }

    /// Add one unit to an existing line. Missing lines are left alone.
    ///
    /// # Errors
    ///
    /// Returns `CartError::QuantityOverflow`, `CartError::TotalOverflow` or
    /// `CartError::Storage`.
    pub fn increment(&mut self, product_id: &ProductId, tier: PriceTier) -> Result<(), CartError> {
        let mut next = self.lines.clone();
        let Some(line) = next.iter_mut().find(|l| l.matches(product_id, tier)) else {
            return Ok(());
        };
        line.quantity = line
            .quantity
            .checked_add(1)
            .ok_or_else(|| CartError::QuantityOverflow(product_id.clone()))?;
        let event = CartEvent::QuantityChanged {
            product_id: product_id.clone(),
            tier,
            quantity: line.quantity.get(),
        };
        if checked_total(&next).is_none() {
            return Err(CartError::TotalOverflow(product_id.clone()));
        }
        self.commit(next, event)
    }

    /// Remove one unit from a line, dropping the line when it reaches zero.
    /// Missing lines are left alone.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be persisted.
    pub fn decrement(&mut self, product_id: &ProductId, tier: PriceTier) -> Result<(), CartError> {
        let Some(pos) = self.position(product_id, tier) else {
            return Ok(());
        };
        let mut next = self.lines.clone();

        let remaining = next
            .get(pos)
            .and_then(|line| NonZeroU32::new(line.quantity.get() - 1));
        let event = match (remaining, next.get_mut(pos)) {
            (Some(quantity), Some(line)) => {
                line.quantity = quantity;
                CartEvent::QuantityChanged {
                    product_id: product_id.clone(),
                    tier,
                    quantity: quantity.get(),
                }
            }
            _ => {
                next.remove(pos);
                CartEvent::LineRemoved {
                    product_id: product_id.clone(),
                    tier,
                }
            }
        };

        self.commit(next, event)
    }

    /// Delete the line for `(product_id, tier)` if present.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the cart cannot be persisted.
    pub fn remove(&mut self, product_id: &ProductId, tier: PriceTier) -> Result<(), CartError> {
        if self.position(product_id, tier).is_none() {
            return Ok(());
        }
        let next = self
            .lines
            .iter()
            .filter(|l| !l.matches(product_id, tier))
            .cloned()
            .collect();
        self.commit(
            next,
            CartEvent::LineRemoved {
                product_id: product_id.clone(),
                tier,
            },
        )
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Storage` if the empty cart cannot be persisted.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.commit(Vec::new(), CartEvent::Cleared)
    }

    /// Observe successful mutations.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent) + Send + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Stop observing.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn position(&self, product_id: &ProductId, tier: PriceTier) -> Option<usize> {
        self.lines.iter().position(|l| l.matches(product_id, tier))
    }

    fn commit(&mut self, next: Vec<CartLine>, event: CartEvent) -> Result<(), CartError> {
        storage::save(self.storage.as_ref(), keys::CART, &next)?;
        self.lines = next;

        add_breadcrumb("cart", &format!("{event:?}"), None);
        debug!(event = ?event, count = self.count(), "Cart updated");
        self.observers.notify(&event);
        Ok(())
    }
}

/// Exact cart total, or `None` if some subtotal or the sum overflows.
///
/// Every mutation checks this before committing, so the saturating
/// [`CartStore::total`] never actually saturates.
fn checked_total(lines: &[CartLine]) -> Option<Price> {
    lines.iter().try_fold(Price::ZERO, |total, line| {
        total.checked_add(line.unit_price().checked_times(line.quantity.get())?)
    })
}

/// Merge duplicate keys that may exist in hand-edited or legacy storage.
fn normalize(stored: Vec<CartLine>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());
    for line in stored {
        match lines
            .iter_mut()
            .find(|l| l.matches(&line.product.id, line.tier))
        {
            Some(existing) => {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity.get())
                    .unwrap_or_else(|| {
                        warn!(
                            product_id = %line.product.id,
                            tier = %line.tier,
                            "Merged stored cart quantity overflows, clamping"
                        );
                        NonZeroU32::MAX
                    });
            }
            None => lines.push(line),
        }
    }
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use preciosa_core::Category;
    use proptest::prelude::*;

    use super::*;
    use crate::storage::{MemoryStorage, Storage};

    pub(crate) fn product(id: &str, wholesale_cents: u32, retail_cents: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Produto {id}"),
            sku: Some(format!("PM-{id}")),
            category: Category::Blusas,
            wholesale_price: Price::from_cents(wholesale_cents),
            retail_price: Price::from_cents(retail_cents),
            sizes: vec!["P".into(), "M".into()],
            colors: vec!["rosa".into()],
            images: vec![format!("https://img.example/{id}.jpg")],
            caption: "Peça em cotton.".into(),
            stock: 10,
            available: true,
            featured: false,
        }
    }

    fn cart() -> (CartStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (CartStore::load(storage.clone()), storage)
    }

    /// Storage whose writes always fail.
    struct ReadOnly;

    impl Storage for ReadOnly {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    #[test]
    fn test_add_same_key_twice_merges() {
        let (mut cart, _) = cart();
        let p = product("P001", 4000, 4500);
        cart.add(&p, PriceTier::Wholesale, 1).unwrap();
        cart.add(&p, PriceTier::Wholesale, 1).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity.get(), 2);
    }

    #[test]
    fn test_same_product_different_tiers_are_distinct_lines() {
        let (mut cart, _) = cart();
        let p = product("P001", 4000, 4500);
        cart.add(&p, PriceTier::Wholesale, 1).unwrap();
        cart.add(&p, PriceTier::Retail, 1).unwrap();

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.total(), Price::from_cents(8500));
    }

    #[test]
    fn test_add_zero_is_rejected() {
        let (mut cart, storage) = cart();
        let err = cart.add(&product("P001", 4000, 4500), PriceTier::Wholesale, 0);
        assert!(matches!(err, Err(CartError::InvalidQuantity(0))));
        assert!(cart.is_empty());
        assert_eq!(storage.get(keys::CART).unwrap(), None);
    }

    #[test]
    fn test_scenario_two_products_total_and_count() {
        let (mut cart, _) = cart();
        cart.add(&product("P001", 4000, 4500), PriceTier::Wholesale, 2)
            .unwrap();
        cart.add(&product("P002", 4000, 4500), PriceTier::Wholesale, 1)
            .unwrap();

        assert_eq!(cart.total(), Price::from_cents(12_000));
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn test_decrement_last_unit_removes_line() {
        let (mut cart, _) = cart();
        let p1 = product("P001", 4000, 4500);
        let p2 = product("P002", 9500, 12_000);
        cart.add(&p1, PriceTier::Wholesale, 2).unwrap();
        cart.add(&p2, PriceTier::Wholesale, 1).unwrap();

        cart.decrement(&p2.id, PriceTier::Wholesale).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert!(cart.line(&p2.id, PriceTier::Wholesale).is_none());
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.total(), Price::from_cents(8000));
    }

    #[test]
    fn test_missing_line_operations_are_noops() {
        let (mut cart, storage) = cart();
        let id = ProductId::new("ghost");
        cart.decrement(&id, PriceTier::Retail).unwrap();
        cart.increment(&id, PriceTier::Retail).unwrap();
        cart.remove(&id, PriceTier::Retail).unwrap();
        assert!(cart.is_empty());
        assert_eq!(storage.get(keys::CART).unwrap(), None);
    }

    #[test]
    fn test_increment_and_remove() {
        let (mut cart, _) = cart();
        let p = product("P003", 9500, 12_000);
        cart.add(&p, PriceTier::Retail, 1).unwrap();
        cart.increment(&p.id, PriceTier::Retail).unwrap();
        assert_eq!(cart.count(), 2);

        cart.remove(&p.id, PriceTier::Retail).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Price::ZERO);
    }

    #[test]
    fn test_reload_restores_identical_lines() {
        let (mut cart, storage) = cart();
        cart.add(&product("P001", 4000, 4500), PriceTier::Wholesale, 2)
            .unwrap();
        cart.add(&product("P003", 9500, 12_000), PriceTier::Retail, 1)
            .unwrap();

        let reloaded = CartStore::load(storage);
        assert_eq!(reloaded.lines(), cart.lines());
    }

    #[test]
    fn test_clear_persists_empty_cart() {
        let (mut cart, storage) = cart();
        cart.add(&product("P001", 4000, 4500), PriceTier::Wholesale, 2)
            .unwrap();
        cart.clear().unwrap();
        assert!(CartStore::load(storage).is_empty());
    }

    #[test]
    fn test_corrupt_storage_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(keys::CART, "{\"oops\": true").unwrap();
        assert!(CartStore::load(storage.clone()).is_empty());

        // A zero quantity is not a valid cart either
        storage
            .set(
                keys::CART,
                r#"[{"product":{"id":"P1","name":"x","wholesale_price":1.0,"retail_price":2.0},"tier":"atacado","quantity":0}]"#,
            )
            .unwrap();
        assert!(CartStore::load(storage).is_empty());
    }

    #[test]
    fn test_duplicate_stored_lines_are_merged() {
        let storage = Arc::new(MemoryStorage::new());
        let line = r#"{"product":{"id":"P1","name":"x","wholesale_price":1.0,"retail_price":2.0},"tier":"atacado","quantity":2}"#;
        storage.set(keys::CART, &format!("[{line},{line}]")).unwrap();

        let cart = CartStore::load(storage);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.count(), 4);
    }

    /// A product whose wholesale price is the largest representable amount.
    fn priced_at_max(id: &str) -> Product {
        let mut p = product(id, u32::MAX, u32::MAX);
        p.wholesale_price = p
            .wholesale_price
            .times(u32::MAX)
            .times(u32::MAX)
            .times(u32::MAX);
        p
    }

    fn line(p: &Product, tier: PriceTier, quantity: u32) -> CartLine {
        CartLine {
            product: ProductSnapshot::from(p),
            tier,
            quantity: NonZeroU32::new(quantity).unwrap(),
        }
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        let (mut cart, storage) = cart();
        let p = priced_at_max("BIG");
        cart.add(&p, PriceTier::Wholesale, 1).unwrap();

        assert!(matches!(
            cart.add(&p, PriceTier::Wholesale, 1),
            Err(CartError::TotalOverflow(_))
        ));
        assert!(matches!(
            cart.increment(&p.id, PriceTier::Wholesale),
            Err(CartError::TotalOverflow(_))
        ));
        assert!(matches!(
            cart.add(&p, PriceTier::Retail, 1),
            Err(CartError::TotalOverflow(_))
        ));

        assert_eq!(cart.count(), 1);
        assert_eq!(cart.total(), p.wholesale_price);
        assert_eq!(CartStore::load(storage).count(), 1);
    }

    #[test]
    fn test_stored_cart_with_overflowing_total_loads_empty() {
        let storage = Arc::new(MemoryStorage::new());
        let p = priced_at_max("BIG");
        let stored = vec![line(&p, PriceTier::Wholesale, 2)];
        storage::save(storage.as_ref(), keys::CART, &stored).unwrap();

        assert!(CartStore::load(storage).is_empty());
    }

    #[test]
    fn test_merged_duplicates_clamp_quantity() {
        let storage = Arc::new(MemoryStorage::new());
        let p = product("P1", 100, 150);
        let stored = vec![
            line(&p, PriceTier::Wholesale, u32::MAX),
            line(&p, PriceTier::Wholesale, 1),
        ];
        storage::save(storage.as_ref(), keys::CART, &stored).unwrap();

        let cart = CartStore::load(storage);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, NonZeroU32::MAX);
    }

    #[test]
    fn test_price_snapshot_is_not_retroactive() {
        let (mut cart, _) = cart();
        let mut p = product("P001", 4000, 4500);
        cart.add(&p, PriceTier::Wholesale, 1).unwrap();

        p.wholesale_price = Price::from_cents(9900);
        cart.add(&p, PriceTier::Wholesale, 1).unwrap();

        assert_eq!(cart.lines()[0].unit_price(), Price::from_cents(4000));
        assert_eq!(cart.total(), Price::from_cents(8000));
    }

    #[test]
    fn test_failed_persist_discards_mutation() {
        let mut cart = CartStore::load(Arc::new(ReadOnly));
        let err = cart.add(&product("P001", 4000, 4500), PriceTier::Wholesale, 1);
        assert!(matches!(err, Err(CartError::Storage(_))));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_observers_see_each_mutation() {
        let (mut cart, _) = cart();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        cart.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let p = product("P001", 4000, 4500);
        cart.add(&p, PriceTier::Wholesale, 1).unwrap();
        cart.increment(&p.id, PriceTier::Wholesale).unwrap();
        cart.decrement(&p.id, PriceTier::Wholesale).unwrap();
        cart.decrement(&p.id, PriceTier::Wholesale).unwrap();
        cart.clear().unwrap();
        // Rejected mutation: no event
        let _ = cart.add(&p, PriceTier::Wholesale, 0);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 5);
        assert!(matches!(events[0], CartEvent::LineAdded { quantity: 1, .. }));
        assert!(matches!(events[1], CartEvent::QuantityChanged { quantity: 2, .. }));
        assert!(matches!(events[2], CartEvent::QuantityChanged { quantity: 1, .. }));
        assert!(matches!(events[3], CartEvent::LineRemoved { .. }));
        assert_eq!(events[4], CartEvent::Cleared);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(usize, PriceTier, u32),
        Increment(usize, PriceTier),
        Decrement(usize, PriceTier),
        Remove(usize, PriceTier),
    }

    fn tier() -> impl Strategy<Value = PriceTier> {
        prop_oneof![Just(PriceTier::Wholesale), Just(PriceTier::Retail)]
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..3_usize, tier(), 1..5_u32).prop_map(|(p, t, q)| Op::Add(p, t, q)),
            (0..3_usize, tier()).prop_map(|(p, t)| Op::Increment(p, t)),
            (0..3_usize, tier()).prop_map(|(p, t)| Op::Decrement(p, t)),
            (0..3_usize, tier()).prop_map(|(p, t)| Op::Remove(p, t)),
        ]
    }

    proptest! {
        #[test]
        fn prop_cart_matches_model(ops in proptest::collection::vec(op(), 0..40)) {
            let products = [
                product("A", 1000, 1500),
                product("B", 4000, 4500),
                product("C", 9500, 12_000),
            ];
            let (mut cart, storage) = cart();
            let mut model: HashMap<(String, PriceTier), u32> = HashMap::new();

            for op in ops {
                match op {
                    Op::Add(i, t, q) => {
                        cart.add(&products[i], t, q).unwrap();
                        *model.entry((products[i].id.to_string(), t)).or_default() += q;
                    }
                    Op::Increment(i, t) => {
                        cart.increment(&products[i].id, t).unwrap();
                        if let Some(q) = model.get_mut(&(products[i].id.to_string(), t)) {
                            *q += 1;
                        }
                    }
                    Op::Decrement(i, t) => {
                        cart.decrement(&products[i].id, t).unwrap();
                        let key = (products[i].id.to_string(), t);
                        if let Some(q) = model.get_mut(&key) {
                            *q -= 1;
                            if *q == 0 {
                                model.remove(&key);
                            }
                        }
                    }
                    Op::Remove(i, t) => {
                        cart.remove(&products[i].id, t).unwrap();
                        model.remove(&(products[i].id.to_string(), t));
                    }
                }

                prop_assert_eq!(cart.lines().len(), model.len());
                for line in cart.lines() {
                    prop_assert!(line.quantity.get() > 0);
                    let expected = model.get(&(line.product.id.to_string(), line.tier)).copied();
                    prop_assert_eq!(Some(line.quantity.get()), expected);
                }
                let count: u64 = model.values().map(|q| u64::from(*q)).sum();
                prop_assert_eq!(cart.count(), count);
                let total: Price = cart
                    .lines()
                    .iter()
                    .map(|l| l.product.price_for(l.tier).times(l.quantity.get()))
                    .sum();
                prop_assert_eq!(cart.total(), total);
            }

            let reloaded = CartStore::load(storage);
            prop_assert_eq!(reloaded.lines(), cart.lines());
        }
    }
}
