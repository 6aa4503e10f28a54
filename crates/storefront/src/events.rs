//! Change notifications for cart and session state.
//!
//! Stores notify their observers after every successful mutation, so
//! front-ends can re-render without polling.

use preciosa_core::{PriceTier, ProductId};

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<E> = Box<dyn FnMut(&E) + Send>;

/// A list of observers for events of type `E`.
pub struct Observers<E> {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback<E>)>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.callbacks.len())
            .finish()
    }
}

impl<E> Observers<E> {
    /// Register a callback invoked after every event.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&E) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, Box::new(callback)));
        id
    }

    /// Remove a callback. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    /// Deliver `event` to every observer, in subscription order.
    pub fn notify(&mut self, event: &E) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// Emitted by the cart after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartEvent {
    /// A new line was appended.
    LineAdded {
        product_id: ProductId,
        tier: PriceTier,
        quantity: u32,
    },
    /// An existing line changed quantity.
    QuantityChanged {
        product_id: ProductId,
        tier: PriceTier,
        quantity: u32,
    },
    /// A line was removed, explicitly or by decrementing to zero.
    LineRemoved {
        product_id: ProductId,
        tier: PriceTier,
    },
    /// Every line was removed.
    Cleared,
}

/// Emitted by the session store on identity changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was established. `local` is set for degraded-mode sessions.
    LoggedIn { name: String, local: bool },
    /// The session was destroyed.
    LoggedOut,
}
