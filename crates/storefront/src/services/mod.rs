//! Services orchestrating the storefront's stores and the backend.
//!
//! - `auth` - session lifecycle (login, registration, logout, offline fallback)
//! - `checkout` - order submission side effects
//! - `caption` - product caption sharing

pub mod auth;
pub mod caption;
pub mod checkout;
