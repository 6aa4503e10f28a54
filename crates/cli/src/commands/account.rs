//! Login, registration and session inspection.

use secrecy::SecretString;

use preciosa_core::{Document, Email, Phone, PriceTier};
use preciosa_storefront::AppState;
use preciosa_storefront::backend::{BestEffortExt, Credentials, LoginId, Registration};
use preciosa_storefront::models::Session;

/// Registration input as typed on the command line.
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub tier: PriceTier,
}

/// Log in with an e-mail or CPF/CNPJ.
///
/// # Errors
///
/// Returns an error if the login id or phone is malformed, a session is
/// already open, or the backend refuses and offline login is disabled.
pub async fn login(
    state: &mut AppState,
    login: &str,
    password: String,
    phone: Option<&str>,
) -> preciosa_storefront::Result<()> {
    let credentials = Credentials {
        login: login.parse::<LoginId>()?,
        password: SecretString::from(password),
        phone: phone.map(Phone::parse).transpose()?,
    };

    let outcome = state.login(credentials).await?;
    if let Err(fallback) = &outcome {
        tracing::warn!(error = %fallback.cause, "Backend unavailable, session created offline");
    }
    welcome(&outcome.into_value());
    Ok(())
}

/// Create an account and log it in.
///
/// # Errors
///
/// Returns an error if a field is malformed, a session is already open, or
/// the backend refuses and offline login is disabled.
pub async fn register(state: &mut AppState, form: RegisterForm) -> preciosa_storefront::Result<()> {
    let registration = Registration {
        name: form.name,
        email: Email::parse(&form.email)?,
        document: form.document.as_deref().map(Document::parse).transpose()?,
        phone: form.phone.as_deref().map(Phone::parse).transpose()?,
        password: SecretString::from(form.password),
        tier: form.tier,
    };

    let outcome = state.register(registration).await?;
    if let Err(fallback) = &outcome {
        tracing::warn!(error = %fallback.cause, "Backend unavailable, account kept offline");
    }
    welcome(&outcome.into_value());
    Ok(())
}

/// # Errors
///
/// Returns an error if the stored session cannot be removed.
pub fn logout(state: &mut AppState) -> preciosa_storefront::Result<()> {
    state.logout()?;
    println!("Sessão encerrada. Seu carrinho foi mantido.");
    Ok(())
}

/// Print who is logged in.
pub fn whoami(state: &AppState) {
    let Some(session) = state.session() else {
        println!("Nenhuma sessão ativa.");
        return;
    };

    let profile = &session.profile;
    println!("{}", profile.display_name());
    if let Some(email) = &profile.email {
        println!("E-mail: {email}");
    }
    if let Some(phone) = &profile.phone {
        println!("Telefone: {phone}");
    }
    if let Some(document) = &profile.document {
        println!("CPF/CNPJ: {document}");
    }
    println!("Preço preferido: {}", profile.tier.label());
    if session.is_local() {
        println!("(sessão offline)");
    }
}

fn welcome(session: &Session) {
    println!("Olá, {}!", session.profile.display_name());
    if session.is_local() {
        println!("Sem conexão com o servidor: entrou em modo offline.");
    }
}
