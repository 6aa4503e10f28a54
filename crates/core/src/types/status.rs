//! Order status and payment method enums.
//!
//! Wire values are the Portuguese names the backend stores.

use serde::{Deserialize, Serialize};

/// Order lifecycle status.
///
/// Orders are created `Pendente`; every later transition is performed by the
/// admin side, never by the storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "confirmado")]
    Confirmed,
    #[serde(rename = "enviado")]
    Shipped,
    #[serde(rename = "entregue")]
    Delivered,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pendente"),
            Self::Confirmed => write!(f, "confirmado"),
            Self::Shipped => write!(f, "enviado"),
            Self::Delivered => write!(f, "entregue"),
        }
    }
}

/// How the buyer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Instant bank transfer.
    #[default]
    Pix,
    /// Credit or debit card.
    #[serde(rename = "cartao")]
    Card,
    /// Bank slip, due in three days.
    Boleto,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pix => write!(f, "pix"),
            Self::Card => write!(f, "cartao"),
            Self::Boleto => write!(f, "boleto"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pix" => Ok(Self::Pix),
            "cartao" | "cartão" | "card" => Ok(Self::Card),
            "boleto" => Ok(Self::Boleto),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}
