//! Preciosa Core - Shared domain types.
//!
//! This crate provides the types used by every Preciosa Modas component:
//! - `storefront` - Cart, session and order submission core
//! - `cli` - Command-line front-end for the storefront core
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices and price tiers, products, contact
//!   details and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
