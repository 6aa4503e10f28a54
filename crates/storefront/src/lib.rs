//! Preciosa Modas storefront core.
//!
//! Cart, session and order submission for a wholesale/retail clothing
//! storefront. Rendering is left to front-ends; this crate owns the state
//! they display and the calls they trigger.
//!
//! # Modules
//!
//! - [`cart`] - cart store with per-line price tiers
//! - [`services::auth`] - session lifecycle with offline fallback
//! - [`order`] / [`whatsapp`] - order records and the WhatsApp message
//! - [`services::checkout`] - order submission side effects
//! - [`backend`] - HTTP client for the catalog, auth and order endpoints
//! - [`state`] - the handle front-ends hold

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod order;
pub mod services;
pub mod state;
pub mod storage;
pub mod whatsapp;

pub use error::{AppError, Result};
pub use state::AppState;
