//! Authentication endpoints.

use std::future::Future;
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use preciosa_core::{ContactError, Document, Email, Phone, PriceTier, UserId};

use super::{ApiClient, ApiError};
use crate::models::UserProfile;

/// What a buyer logs in with: an e-mail or a CPF/CNPJ document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginId {
    Email(Email),
    Document(Document),
}

impl FromStr for LoginId {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('@') {
            Email::parse(s).map(Self::Email)
        } else {
            Document::parse(s).map(Self::Document)
        }
    }
}

impl std::fmt::Display for LoginId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Email(email) => write!(f, "{email}"),
            Self::Document(document) => write!(f, "{document}"),
        }
    }
}

/// Login form.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub login: LoginId,
    pub password: SecretString,
    /// Contact phone, kept on the profile if the session has to be
    /// created offline.
    pub phone: Option<Phone>,
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: Email,
    pub document: Option<Document>,
    pub phone: Option<Phone>,
    pub password: SecretString,
    pub tier: PriceTier,
}

/// Successful login or registration.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    pub token: SecretString,
    pub user: UserProfile,
}

/// Remote authentication.
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;

    /// Create an account and log it in.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthResponse, ApiError>> + Send;
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Serialize)]
struct LoginBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpf_cnpj: Option<&'a str>,
    password: &'a str,
}

impl<'a> From<&'a Credentials> for LoginBody<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        let (email, cpf_cnpj) = match &credentials.login {
            LoginId::Email(email) => (Some(email.as_str()), None),
            LoginId::Document(document) => (None, Some(document.as_str())),
        };
        Self {
            email,
            cpf_cnpj,
            password: credentials.password.expose_secret(),
        }
    }
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    name: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cpf_cnpj: Option<&'a str>,
    password: &'a str,
    tipo: PriceTier,
}

#[derive(Deserialize)]
struct AuthBody {
    token: String,
    user: RemoteUser,
}

/// User as returned by the backend.
///
/// Contact fields are validated leniently: a value the storefront cannot
/// parse is dropped instead of failing the whole login.
#[derive(Deserialize)]
struct RemoteUser {
    #[serde(default)]
    id: Option<UserId>,
    #[serde(alias = "nome", default)]
    name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(alias = "telefone", default)]
    phone: Option<String>,
    #[serde(default)]
    cpf_cnpj: Option<String>,
    #[serde(default)]
    tipo: Option<String>,
}

impl From<RemoteUser> for UserProfile {
    fn from(user: RemoteUser) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email.and_then(|e| Email::parse(&e).ok()),
            phone: user.phone.and_then(|p| Phone::parse(&p).ok()),
            document: user.cpf_cnpj.and_then(|d| Document::parse(&d).ok()),
            tier: user
                .tipo
                .and_then(|t| t.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl From<AuthBody> for AuthResponse {
    fn from(body: AuthBody) -> Self {
        Self {
            token: SecretString::from(body.token),
            user: body.user.into(),
        }
    }
}

impl AuthApi for ApiClient {
    #[instrument(skip(self, credentials), fields(login = %credentials.login))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        let body: AuthBody = self
            .post_json("auth/login", &LoginBody::from(credentials), None)
            .await?;
        Ok(body.into())
    }

    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        let request = RegisterBody {
            name: &registration.name,
            email: registration.email.as_str(),
            phone: registration.phone.as_ref().map(Phone::as_str),
            cpf_cnpj: registration.document.as_ref().map(Document::as_str),
            password: registration.password.expose_secret(),
            tipo: registration.tier,
        };
        let body: AuthBody = self.post_json("auth/register", &request, None).await?;
        Ok(body.into())
    }
}
