//! Buyer profile.

use serde::{Deserialize, Serialize};

use preciosa_core::{Document, Email, Phone, PriceTier, UserId};

/// The identity attached to a session and to submitted orders.
///
/// Field names follow the backend's user document; the English aliases
/// accept the lighter auth API shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend id. `None` for sessions created offline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(rename = "nome", alias = "name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(
        default,
        rename = "telefone",
        alias = "phone",
        skip_serializing_if = "Option::is_none"
    )]
    pub phone: Option<Phone>,
    #[serde(
        default,
        rename = "cpf_cnpj",
        alias = "document",
        skip_serializing_if = "Option::is_none"
    )]
    pub document: Option<Document>,
    /// Preferred tier, used as the default for new cart lines.
    #[serde(default, rename = "tipo", alias = "tier")]
    pub tier: PriceTier,
}

impl UserProfile {
    /// Name to greet the buyer with.
    ///
    /// Falls back to the e-mail's local part, then to a generic label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if !name.is_empty() {
            return name;
        }
        self.email
            .as_ref()
            .map_or("Cliente", |email| email.local_part())
    }
}
