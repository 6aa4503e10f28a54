//! Type-safe price representation using decimal arithmetic.
//!
//! All amounts are Brazilian reais. Display follows the pt-BR convention
//! (`R$ 1.234,56`), which is also the format used in outbound WhatsApp
//! messages and product captions.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced when building prices or parsing price tiers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// Prices can never be negative.
    #[error("price cannot be negative: {0}")]
    Negative(Decimal),
    /// The tier is neither wholesale nor retail.
    #[error("invalid price tier: {0:?} (expected \"atacado\" or \"varejo\")")]
    InvalidTier(String),
}

/// A non-negative amount in reais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// Zero reais.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// Create a price from an amount in centavos.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// The price of `quantity` units, saturating at `Decimal::MAX`.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// The price of `quantity` units, or `None` if it does not fit.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// `self + rhs`, or `None` if it does not fit.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// The amount rounded half away from zero to whole centavos.
    #[must_use]
    pub fn rounded(self) -> Decimal {
        self.0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at `Decimal::MAX`; use [`Price::checked_add`] to detect it.
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format!("{:.2}", self.rounded());
        let (units, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
        write!(f, "R$ {},{cents}", group_thousands(units))
    }
}

/// Insert `.` between groups of three digits, pt-BR style.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

// The backend speaks JSON numbers for money.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let amount = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::new(amount).map_err(serde::de::Error::custom)
    }
}

/// The two mutually exclusive pricing modes a buyer may purchase under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum PriceTier {
    /// Atacado - reseller pricing.
    #[default]
    #[serde(rename = "atacado")]
    Wholesale,
    /// Varejo - single-unit pricing.
    #[serde(rename = "varejo")]
    Retail,
}

impl PriceTier {
    /// Wire name (`atacado` / `varejo`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Wholesale => "atacado",
            Self::Retail => "varejo",
        }
    }

    /// Capitalised label used in captions and messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Wholesale => "Atacado",
            Self::Retail => "Varejo",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTier {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atacado" | "wholesale" => Ok(Self::Wholesale),
            "varejo" | "retail" => Ok(Self::Retail),
            _ => Err(PriceError::InvalidTier(s.to_owned())),
        }
    }
}

/// Anything carrying a wholesale and a retail price.
///
/// `price_for` is pure: the same value and tier always resolve to the same
/// stored price.
pub trait PriceResolver {
    /// Atacado price.
    fn wholesale_price(&self) -> Price;

    /// Varejo price.
    fn retail_price(&self) -> Price;

    /// Unit price under `tier`.
    fn price_for(&self, tier: PriceTier) -> Price {
        match tier {
            PriceTier::Wholesale => self.wholesale_price(),
            PriceTier::Retail => self.retail_price(),
        }
    }
}
