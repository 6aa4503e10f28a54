//! Authentication error types.

use thiserror::Error;

use preciosa_core::ContactError;

use crate::backend::ApiError;
use crate::storage::StorageError;

/// Errors that can occur during login, registration or logout.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A session already exists; log out first.
    #[error("already logged in as {0}")]
    AlreadyAuthenticated(String),

    /// E-mail, document or phone is malformed.
    #[error("invalid contact: {0}")]
    InvalidContact(#[from] ContactError),

    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// Registration name was empty.
    #[error("name must not be empty")]
    EmptyName,

    /// The backend refused or could not be reached, and offline login is
    /// disabled.
    #[error("authentication failed: {0}")]
    Remote(#[source] ApiError),

    /// The session could not be persisted.
    #[error("failed to persist session: {0}")]
    Storage(#[from] StorageError),
}
