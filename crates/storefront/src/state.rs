//! Application state shared by front-ends.
//!
//! `AppState` is the explicit handle a front-end holds: it owns the cart,
//! the session and the order history, and applies the price gating policy
//! across them. Nothing in the crate is global.

use tracing::instrument;

use preciosa_core::{PaymentMethod, Price, PriceResolver, PriceTier, Product, ProductId};

use crate::backend::{ApiClient, BestEffort, Credentials, RemoteOrder, Registration};
use crate::cart::CartStore;
use crate::config::StorefrontConfig;
use crate::error::{AppError, Result};
use crate::events::{CartEvent, SessionEvent, SubscriptionId};
use crate::models::Session;
use crate::order::OrderHistory;
use crate::services::auth::SessionStore;
use crate::services::caption::{Clipboard, Notice, caption_for, share_caption};
use crate::services::checkout::{Checkout, LinkOpener, Receipt};
use crate::storage::{FileStorage, SharedStorage};

/// Everything a storefront front-end needs.
pub struct AppState {
    config: StorefrontConfig,
    api: ApiClient,
    cart: CartStore,
    session: SessionStore<ApiClient>,
    history: OrderHistory,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("cart", &self.cart)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Open the state stored under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage directory cannot be created or the
    /// HTTP client cannot be built.
    pub fn open(config: StorefrontConfig) -> Result<Self> {
        let storage = FileStorage::open(&config.data_dir)?;
        Self::with_storage(config, std::sync::Arc::new(storage))
    }

    /// Build the state over an explicit storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(config: StorefrontConfig, storage: SharedStorage) -> Result<Self> {
        let api = ApiClient::new(&config)?;
        let cart = CartStore::load(storage.clone());
        let session = SessionStore::load(api.clone(), storage.clone(), config.offline_login);
        let history = OrderHistory::new(storage, config.order_history_limit);

        Ok(Self {
            config,
            api,
            cart,
            session,
            history,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// Backend client, for catalog access.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    #[must_use]
    pub const fn history(&self) -> &OrderHistory {
        &self.history
    }

    /// The current session, if any.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.current()
    }

    // =========================================================================
    // Price gating
    // =========================================================================

    /// Whether prices may be shown right now.
    #[must_use]
    pub fn prices_visible(&self) -> bool {
        !self.config.checkout_policy.is_gated() || self.session.current().is_some()
    }

    /// The price to display, or `None` while prices are hidden.
    #[must_use]
    pub fn visible_price(&self, product: &Product, tier: PriceTier) -> Option<Price> {
        self.prices_visible().then(|| product.price_for(tier))
    }

    /// Tier used when the caller does not pick one: the buyer's preferred
    /// tier, or wholesale.
    #[must_use]
    pub fn default_tier(&self) -> PriceTier {
        self.session.default_tier()
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add `product` to the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LoginRequired` while prices are hidden, or the
    /// cart's error.
    pub fn add_to_cart(
        &mut self,
        product: &Product,
        tier: Option<PriceTier>,
        quantity: u32,
    ) -> Result<()> {
        self.ensure_prices_visible()?;
        let tier = tier.unwrap_or_else(|| self.default_tier());
        Ok(self.cart.add(product, tier, quantity)?)
    }

    /// Add one unit to an existing line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LoginRequired` while prices are hidden, or the
    /// cart's error.
    pub fn increment(&mut self, product_id: &ProductId, tier: PriceTier) -> Result<()> {
        self.ensure_prices_visible()?;
        Ok(self.cart.increment(product_id, tier)?)
    }

    /// Remove one unit from a line.
    ///
    /// # Errors
    ///
    /// Returns the cart's error.
    pub fn decrement(&mut self, product_id: &ProductId, tier: PriceTier) -> Result<()> {
        Ok(self.cart.decrement(product_id, tier)?)
    }

    /// Delete a line.
    ///
    /// # Errors
    ///
    /// Returns the cart's error.
    pub fn remove(&mut self, product_id: &ProductId, tier: PriceTier) -> Result<()> {
        Ok(self.cart.remove(product_id, tier)?)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns the cart's error.
    pub fn clear_cart(&mut self) -> Result<()> {
        Ok(self.cart.clear()?)
    }

    pub fn subscribe_cart<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CartEvent) + Send + 'static,
    {
        self.cart.subscribe(callback)
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Log in. See [`SessionStore::login`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` on failure.
    pub async fn login(&mut self, credentials: Credentials) -> Result<BestEffort<Session>> {
        Ok(self.session.login(credentials).await?)
    }

    /// Register. See [`SessionStore::register`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` on failure.
    pub async fn register(&mut self, registration: Registration) -> Result<BestEffort<Session>> {
        Ok(self.session.register(registration).await?)
    }

    /// Log out, keeping the cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Auth` if the stored session cannot be removed.
    pub fn logout(&mut self) -> Result<()> {
        Ok(self.session.logout()?)
    }

    pub fn subscribe_session<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.session.subscribe(callback)
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Submit the cart as an order and open the WhatsApp link.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Checkout` if no order could be built or the cart
    /// could not be cleared afterwards.
    pub async fn checkout(
        &mut self,
        payment_method: PaymentMethod,
        opener: &dyn LinkOpener,
    ) -> Result<Receipt> {
        let checkout = Checkout::new(&self.config, &self.api, &self.history, opener);
        Ok(checkout
            .submit(&mut self.cart, self.session.current(), payment_method)
            .await?)
    }

    /// The buyer's orders as the backend knows them.
    ///
    /// # Errors
    ///
    /// Returns `AppError::LoginRequired` without a remote session (offline
    /// sessions have no backend identity), or `AppError::Api` if the request
    /// fails.
    #[instrument(skip(self))]
    pub async fn remote_orders(&self) -> Result<Vec<RemoteOrder>> {
        let session = self.session.current().ok_or(AppError::LoginRequired)?;
        let (Some(user_id), Some(bearer)) = (&session.profile.id, session.bearer()) else {
            return Err(AppError::LoginRequired);
        };
        Ok(self.api.orders_for_user(user_id, bearer).await?)
    }

    // =========================================================================
    // Captions
    // =========================================================================

    /// Caption for `product`; the price line is left out while prices are
    /// hidden.
    #[must_use]
    pub fn caption(&self, product: &Product, tier: PriceTier) -> String {
        caption_for(product, self.prices_visible().then_some(tier))
    }

    /// Copy the caption for `product` and report the outcome.
    pub fn share_caption(
        &self,
        product: &Product,
        tier: PriceTier,
        clipboard: &mut dyn Clipboard,
    ) -> Notice {
        share_caption(clipboard, &self.caption(product, tier))
    }

    fn ensure_prices_visible(&self) -> Result<()> {
        if self.prices_visible() {
            Ok(())
        } else {
            Err(AppError::LoginRequired)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use url::Url;

    use super::*;
    use crate::cart::tests::product;
    use crate::config::CheckoutPolicy;
    use crate::storage::MemoryStorage;

    fn state(policy: CheckoutPolicy) -> AppState {
        let mut config = StorefrontConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        config.checkout_policy = policy;
        AppState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap()
    }

    #[test]
    fn test_open_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = StorefrontConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        config.data_dir = dir.path().join("store");

        let mut state = AppState::open(config.clone()).unwrap();
        state
            .add_to_cart(&product("P001", 4000, 4500), None, 1)
            .unwrap();
        assert!(dir.path().join("store/cart.json").exists());

        let reopened = AppState::open(config).unwrap();
        assert_eq!(reopened.cart().count(), 1);
    }

    #[test]
    fn test_gated_state_hides_prices_and_blocks_cart() {
        let mut state = state(CheckoutPolicy::SessionRequired);
        let p = product("P001", 4000, 4500);

        assert!(!state.prices_visible());
        assert_eq!(state.visible_price(&p, PriceTier::Wholesale), None);
        assert!(matches!(
            state.add_to_cart(&p, None, 1),
            Err(AppError::LoginRequired)
        ));
        assert!(state.cart().is_empty());
        assert_eq!(state.caption(&p, PriceTier::Retail), "Produto P001\nPeça em cotton.");
    }

    #[test]
    fn test_open_state_uses_default_tier() {
        let mut state = state(CheckoutPolicy::GuestAllowed);
        let p = product("P001", 4000, 4500);

        assert_eq!(state.visible_price(&p, PriceTier::Retail), Some(Price::from_cents(4500)));
        state.add_to_cart(&p, None, 2).unwrap();
        state.add_to_cart(&p, Some(PriceTier::Retail), 1).unwrap();

        assert_eq!(state.cart().lines().len(), 2);
        assert_eq!(state.cart().total(), Price::from_cents(12_500));

        state.decrement(&p.id, PriceTier::Retail).unwrap();
        state.remove(&p.id, PriceTier::Wholesale).unwrap();
        assert!(state.cart().is_empty());
    }

    #[tokio::test]
    async fn test_remote_orders_need_remote_session() {
        let state = state(CheckoutPolicy::GuestAllowed);
        assert!(matches!(
            state.remote_orders().await,
            Err(AppError::LoginRequired)
        ));
    }
}
