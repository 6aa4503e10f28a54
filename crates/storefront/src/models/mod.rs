//! Domain models owned by the storefront.
//!
//! Catalog types live in `preciosa-core`; these are the buyer-side records
//! the storefront creates and persists itself.

pub mod session;
pub mod user;

pub use session::{Session, SessionOrigin};
pub use user::UserProfile;
