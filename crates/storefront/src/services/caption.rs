//! Product caption sharing ("copiar legenda").
//!
//! Resellers repost products on their own channels; the caption bundles
//! name, price and description so it can be pasted as-is.

use thiserror::Error;
use tracing::{debug, warn};

use preciosa_core::{PriceResolver, PriceTier, Product};

/// The system clipboard is missing or refused the write.
#[derive(Debug, Error)]
#[error("clipboard unavailable: {0}")]
pub struct ClipboardError(pub String);

/// Somewhere text can be copied to.
pub trait Clipboard {
    /// Replace the clipboard contents.
    ///
    /// # Errors
    ///
    /// Returns `ClipboardError` if the clipboard cannot be written.
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

/// A short-lived message for the user (toast, status line...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: &'static str,
}

impl Notice {
    pub const COPIED: Self = Self {
        kind: NoticeKind::Success,
        message: "Legenda copiada!",
    };

    pub const COPY_FAILED: Self = Self {
        kind: NoticeKind::Failure,
        message: "Não foi possível copiar.",
    };
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message)
    }
}

/// Caption text for `product`.
///
/// With a tier: `{name} — {Atacado|Varejo} R$ x,yy` followed by the
/// description. Without one (prices hidden), the name alone heads the text.
#[must_use]
pub fn caption_for(product: &Product, tier: Option<PriceTier>) -> String {
    let header = match tier {
        Some(tier) => format!(
            "{} — {} {}",
            product.name,
            tier.label(),
            product.price_for(tier)
        ),
        None => product.name.clone(),
    };
    let caption = product.caption.trim();
    if caption.is_empty() {
        header
    } else {
        format!("{header}\n{caption}")
    }
}

/// Copy `text` and report the outcome. Failures are logged, never raised.
pub fn share_caption(clipboard: &mut dyn Clipboard, text: &str) -> Notice {
    match clipboard.set_text(text) {
        Ok(()) => {
            debug!(chars = text.chars().count(), "Caption copied");
            Notice::COPIED
        }
        Err(e) => {
            warn!(error = %e, "Failed to copy caption");
            Notice::COPY_FAILED
        }
    }
}
