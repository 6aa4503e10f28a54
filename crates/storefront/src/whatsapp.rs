//! WhatsApp order message and deep link.

use std::fmt::Write as _;

use crate::cart::CartStore;

/// Closing line of every order message.
pub const GREETING: &str = "Olá! Quero finalizar esse pedido.";

/// Render the cart as the plain-text order message.
///
/// The output is deterministic: one bullet per cart line in cart order,
/// then the total and the greeting.
///
/// ```text
/// *Pedido Preciosa Modas*
/// • Blusa Muscle Tee (PM-MUSCLE-TEE-001) — 2x R$ 80,00
///
/// Total: *R$ 80,00*
///
/// Olá! Quero finalizar esse pedido.
/// ```
#[must_use]
pub fn build_whatsapp_message(cart: &CartStore, brand_name: &str) -> String {
    let mut message = format!("*Pedido {brand_name}*\n");

    for line in cart.lines() {
        let product = &line.product;
        let sku = product
            .sku
            .as_deref()
            .map(|sku| format!(" ({sku})"))
            .unwrap_or_default();
        // Writing to a String cannot fail
        let _ = writeln!(
            message,
            "• {}{sku} — {}x {}",
            product.name,
            line.quantity,
            line.subtotal()
        );
    }

    let _ = write!(message, "\nTotal: *{}*\n\n{GREETING}", cart.total());
    message
}

/// A `wa.me` deep link carrying a pre-filled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsAppLink {
    phone: String,
    message: String,
}

impl WhatsAppLink {
    /// Link to `phone` (digits are kept, everything else is dropped).
    #[must_use]
    pub fn new(phone: &str, message: impl Into<String>) -> Self {
        Self {
            phone: phone.chars().filter(char::is_ascii_digit).collect(),
            message: message.into(),
        }
    }

    /// The unencoded message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `https://wa.me/<phone>?text=<percent-encoded message>`.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "https://wa.me/{}?text={}",
            self.phone,
            urlencoding::encode(&self.message)
        )
    }
}

impl std::fmt::Display for WhatsAppLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url())
    }
}
