//! Core types for Preciosa Modas.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use contact::{ContactError, Document, Email, Phone};
pub use id::*;
pub use price::{Price, PriceError, PriceResolver, PriceTier};
pub use product::{Category, Product};
pub use status::*;
