//! Order submission.
//!
//! Submitting runs three side effects in a fixed sequence: record the order
//! in local history, send it to the backend, open the WhatsApp link. None of
//! them depends on another succeeding. Once they have run the cart is
//! cleared.

use thiserror::Error;
use tracing::{info, instrument, warn};

use preciosa_core::{OrderId, PaymentMethod};

use crate::backend::{BestEffort, LocalFallback, OrderApi};
use crate::cart::{CartError, CartStore};
use crate::config::{CheckoutPolicy, StorefrontConfig};
use crate::error::add_breadcrumb;
use crate::models::Session;
use crate::order::{OrderError, OrderHistory, OrderRequest, build_order};
use crate::whatsapp::{WhatsAppLink, build_whatsapp_message};

/// The link could not be handed to a browser or app.
#[derive(Debug, Error)]
#[error("could not open link: {0}")]
pub struct OpenLinkError(pub String);

/// Opens outbound links (browser, OS handler, or just printing them).
pub trait LinkOpener: Send + Sync {
    /// Open `url`.
    ///
    /// # Errors
    ///
    /// Returns `OpenLinkError` if nothing could handle the link.
    fn open(&self, url: &str) -> Result<(), OpenLinkError>;
}

/// Errors that stop a submission.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing was submitted.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// The order went out but the cart could not be emptied.
    #[error("order sent but cart could not be cleared: {0}")]
    Cart(#[from] CartError),
}

/// What happened during a submission.
#[derive(Debug)]
pub struct Receipt {
    pub order: OrderRequest,
    /// Whether the order reached local history.
    pub saved_locally: bool,
    /// Backend order id, or the local id when the backend call failed.
    pub remote: BestEffort<OrderId>,
    pub link: WhatsAppLink,
    pub link_opened: bool,
}

/// Submits the cart as an order.
pub struct Checkout<'a, O> {
    api: &'a O,
    history: &'a OrderHistory,
    opener: &'a dyn LinkOpener,
    brand_name: &'a str,
    whatsapp_phone: &'a str,
    policy: CheckoutPolicy,
}

impl<'a, O: OrderApi> Checkout<'a, O> {
    #[must_use]
    pub fn new(
        config: &'a StorefrontConfig,
        api: &'a O,
        history: &'a OrderHistory,
        opener: &'a dyn LinkOpener,
    ) -> Self {
        Self {
            api,
            history,
            opener,
            brand_name: &config.brand_name,
            whatsapp_phone: &config.whatsapp_phone,
            policy: config.checkout_policy,
        }
    }

    /// Submit the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Order` if no order can be built (empty cart,
    /// or login required); nothing is sent in that case. Returns
    /// `CheckoutError::Cart` if everything ran but the cart could not be
    /// cleared.
    #[instrument(skip_all, fields(lines = cart.lines().len(), payment = %payment_method))]
    pub async fn submit(
        &self,
        cart: &mut CartStore,
        session: Option<&Session>,
        payment_method: PaymentMethod,
    ) -> Result<Receipt, CheckoutError> {
        let order = build_order(cart, session, self.policy, payment_method)?;
        let link = WhatsAppLink::new(
            self.whatsapp_phone,
            build_whatsapp_message(cart, self.brand_name),
        );

        let saved_locally = match self.history.record(&order) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, order_id = %order.id, "Failed to record order locally");
                false
            }
        };

        let bearer = session.and_then(Session::bearer);
        let remote = match self.api.create_order(&order, bearer).await {
            Ok(created) => Ok(created.id),
            Err(cause) => {
                warn!(error = %cause, order_id = %order.id, "Order not sent to backend, kept locally");
                Err(LocalFallback {
                    value: order.id.clone(),
                    cause,
                })
            }
        };

        let link_opened = match self.opener.open(&link.url()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to open WhatsApp link");
                false
            }
        };

        cart.clear()?;

        add_breadcrumb(
            "checkout",
            "Order submitted",
            Some(&[("order_id", order.id.as_str())]),
        );
        info!(
            order_id = %order.id,
            total = %order.total,
            remote = remote.is_ok(),
            saved_locally,
            link_opened,
            "Order submitted"
        );

        Ok(Receipt {
            order,
            saved_locally,
            remote,
            link,
            link_opened,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::{Arc, Mutex};

    use preciosa_core::{OrderStatus, Price, PriceTier};
    use url::Url;

    use super::*;
    use crate::backend::{ApiError, RemoteOrder};
    use crate::cart::tests::product;
    use crate::storage::MemoryStorage;

    struct FakeOrders {
        accept: bool,
        seen: Mutex<Vec<(OrderRequest, Option<String>)>>,
    }

    impl FakeOrders {
        fn new(accept: bool) -> Self {
            Self {
                accept,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl OrderApi for FakeOrders {
        async fn create_order(
            &self,
            order: &OrderRequest,
            bearer: Option<&str>,
        ) -> Result<RemoteOrder, ApiError> {
            self.seen
                .lock()
                .unwrap()
                .push((order.clone(), bearer.map(String::from)));
            if !self.accept {
                return Err(ApiError::Api {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(RemoteOrder {
                id: OrderId::new("srv-1"),
                total: order.total,
                status: OrderStatus::Pending,
                payment_method: Some(order.payment_method),
                created_at: None,
                channel: Some(order.channel.clone()),
                items: order.items.clone(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingOpener {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl LinkOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<(), OpenLinkError> {
            self.opened.lock().unwrap().push(url.to_string());
            if self.fail {
                Err(OpenLinkError("no browser".into()))
            } else {
                Ok(())
            }
        }
    }

    fn config(policy: CheckoutPolicy) -> StorefrontConfig {
        let mut config = StorefrontConfig::new(Url::parse("http://localhost:8000").unwrap());
        config.checkout_policy = policy;
        config
    }

    fn cart() -> CartStore {
        let mut cart = CartStore::load(Arc::new(MemoryStorage::new()));
        cart.add(&product("P001", 4000, 4500), PriceTier::Wholesale, 2)
            .unwrap();
        cart.add(&product("P002", 4000, 4500), PriceTier::Wholesale, 1)
            .unwrap();
        cart
    }

    #[tokio::test]
    async fn test_guest_submission_runs_every_step() {
        let config = config(CheckoutPolicy::GuestAllowed);
        let api = FakeOrders::new(true);
        let history = OrderHistory::new(Arc::new(MemoryStorage::new()), 10);
        let opener = RecordingOpener::default();
        let mut cart = cart();

        let receipt = Checkout::new(&config, &api, &history, &opener)
            .submit(&mut cart, None, PaymentMethod::Pix)
            .await
            .unwrap();

        assert!(receipt.saved_locally);
        assert_eq!(receipt.remote.as_ref().unwrap(), &OrderId::new("srv-1"));
        assert!(receipt.link_opened);
        assert_eq!(receipt.order.total, Price::from_cents(12_000));
        assert!(receipt.link.message().contains("Total: *R$ 120,00*"));
        assert!(cart.is_empty());

        assert_eq!(history.entries(), vec![receipt.order.clone()]);
        let seen = api.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, None);
        assert_eq!(*opener.opened.lock().unwrap(), vec![receipt.link.url()]);
    }

    #[tokio::test]
    async fn test_remote_failure_still_opens_link() {
        let config = config(CheckoutPolicy::GuestAllowed);
        let api = FakeOrders::new(false);
        let history = OrderHistory::new(Arc::new(MemoryStorage::new()), 10);
        let opener = RecordingOpener::default();
        let mut cart = cart();

        let receipt = Checkout::new(&config, &api, &history, &opener)
            .submit(&mut cart, None, PaymentMethod::Pix)
            .await
            .unwrap();

        let fallback = receipt.remote.as_ref().unwrap_err();
        assert_eq!(fallback.value, receipt.order.id);
        assert!(receipt.link_opened);
        assert!(receipt.saved_locally);
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_gated_policy_requires_session() {
        let config = config(CheckoutPolicy::SessionRequired);
        let api = FakeOrders::new(true);
        let history = OrderHistory::new(Arc::new(MemoryStorage::new()), 10);
        let opener = RecordingOpener::default();
        let mut cart = cart();

        let err = Checkout::new(&config, &api, &history, &opener)
            .submit(&mut cart, None, PaymentMethod::Pix)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Order(OrderError::LoginRequired)));
        assert_eq!(cart.count(), 3);
        assert!(history.entries().is_empty());
        assert!(api.seen.lock().unwrap().is_empty());
        assert!(opener.opened.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_opener_failure_is_reported_not_raised() {
        let config = config(CheckoutPolicy::GuestAllowed);
        let api = FakeOrders::new(true);
        let history = OrderHistory::new(Arc::new(MemoryStorage::new()), 10);
        let opener = RecordingOpener {
            fail: true,
            ..RecordingOpener::default()
        };
        let mut cart = cart();

        let receipt = Checkout::new(&config, &api, &history, &opener)
            .submit(&mut cart, None, PaymentMethod::Boleto)
            .await
            .unwrap();

        assert!(!receipt.link_opened);
        assert!(receipt.link.url().starts_with("https://wa.me/5575991451074?text="));
        assert!(cart.is_empty());
    }
}
