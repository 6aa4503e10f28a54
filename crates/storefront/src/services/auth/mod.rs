//! Authentication service.
//!
//! Owns the buyer's session: restores it from storage on start-up, creates
//! it through the auth API, and destroys it on logout.
//!
//! # States
//!
//! ```text
//! Anonymous ──login/register──▶ Authenticating ──success──▶ Authenticated
//!     ▲                              │                            │
//!     └──── remote failure ──────────┘                            │
//!           (offline login disabled)                              │
//!     ▲                                                           │
//!     └──────────────────────────── logout ───────────────────────┘
//! ```
//!
//! With offline login enabled a remote failure still ends in
//! `Authenticated`, holding a locally minted session.

mod error;

pub use error::AuthError;

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use preciosa_core::PriceTier;

use crate::backend::{ApiError, AuthApi, AuthResponse, BestEffort, Credentials, LocalFallback, LoginId, Registration};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::events::{Observers, SessionEvent, SubscriptionId};
use crate::models::session::LOCAL_TOKEN_PREFIX;
use crate::models::{Session, SessionOrigin, UserProfile};
use crate::storage::{self, SharedStorage, keys};

/// Length of the random part of a local token.
const LOCAL_TOKEN_LENGTH: usize = 32;

/// Where the session lifecycle currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Profile as persisted under `user_profile`.
#[derive(Serialize, Deserialize)]
struct ProfileDocument {
    #[serde(flatten)]
    profile: UserProfile,
    #[serde(default)]
    origin: SessionOrigin,
}

/// The session store.
pub struct SessionStore<A> {
    api: A,
    storage: SharedStorage,
    offline_login: bool,
    state: AuthState,
    session: Option<Session>,
    observers: Observers<SessionEvent>,
}

impl<A> std::fmt::Debug for SessionStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("offline_login", &self.offline_login)
            .finish_non_exhaustive()
    }
}

impl<A: AuthApi> SessionStore<A> {
    /// Restore the persisted session, if any.
    ///
    /// A token without a profile (or the reverse) is treated as no session.
    #[must_use]
    pub fn load(api: A, storage: SharedStorage, offline_login: bool) -> Self {
        let token: Option<String> = storage::load(storage.as_ref(), keys::TOKEN);
        let document: Option<ProfileDocument> = storage::load(storage.as_ref(), keys::USER_PROFILE);

        let session = match (token, document) {
            (Some(token), Some(document)) => Some(Session {
                profile: document.profile,
                token: SecretString::from(token),
                origin: document.origin,
            }),
            (None, None) => None,
            _ => {
                warn!("Stored session is incomplete, starting anonymous");
                None
            }
        };

        if let Some(session) = &session {
            debug!(name = %session.profile.display_name(), local = session.is_local(), "Session restored");
            set_sentry_user(&sentry_id(&session.profile), session.profile.email.as_ref().map(|e| e.as_str()));
        }

        Self {
            api,
            storage,
            offline_login,
            state: if session.is_some() {
                AuthState::Authenticated
            } else {
                AuthState::Anonymous
            },
            session,
            observers: Observers::default(),
        }
    }

    /// The current session, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The lifecycle state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// The tier new cart lines should default to.
    #[must_use]
    pub fn default_tier(&self) -> PriceTier {
        self.session
            .as_ref()
            .map_or_else(PriceTier::default, |s| s.profile.tier)
    }

    /// Log in through the auth API.
    ///
    /// Returns `Ok(Ok(session))` when the backend accepted the credentials
    /// and `Ok(Err(LocalFallback))` when a local session was created
    /// instead.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AlreadyAuthenticated` if a session exists,
    /// `AuthError::EmptyPassword` for an empty password,
    /// `AuthError::Remote` when the backend fails and offline login is
    /// disabled, and `AuthError::Storage` if the session cannot be saved.
    #[instrument(skip(self, credentials), fields(login = %credentials.login))]
    pub async fn login(&mut self, credentials: Credentials) -> Result<BestEffort<Session>, AuthError> {
        self.ensure_anonymous()?;
        if credentials.password.expose_secret().is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        self.state = AuthState::Authenticating;
        let attempt = self.api.login(&credentials).await.map(|mut response| {
            // Keep the phone typed at login if the backend has none
            if response.user.phone.is_none() {
                response.user.phone.clone_from(&credentials.phone);
            }
            response
        });

        self.settle(attempt, || offline_login_profile(&credentials))
    }

    /// Create an account through the auth API and log it in.
    ///
    /// Same outcome contract as [`login`](Self::login).
    ///
    /// # Errors
    ///
    /// As for `login`, plus `AuthError::EmptyName` for a blank name.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(
        &mut self,
        registration: Registration,
    ) -> Result<BestEffort<Session>, AuthError> {
        self.ensure_anonymous()?;
        if registration.name.trim().is_empty() {
            return Err(AuthError::EmptyName);
        }
        if registration.password.expose_secret().is_empty() {
            return Err(AuthError::EmptyPassword);
        }

        self.state = AuthState::Authenticating;
        let attempt = self.api.register(&registration).await;

        self.settle(attempt, || UserProfile {
            id: None,
            name: registration.name.trim().to_string(),
            email: Some(registration.email.clone()),
            phone: registration.phone.clone(),
            document: registration.document.clone(),
            tier: registration.tier,
        })
    }

    /// Destroy the session. The cart is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the stored session cannot be removed;
    /// the in-memory and stored session are both kept in that case.
    pub fn logout(&mut self) -> Result<(), AuthError> {
        let Some(session) = &self.session else {
            return Ok(());
        };

        self.storage.remove(keys::TOKEN)?;
        if let Err(e) = self.storage.remove(keys::USER_PROFILE) {
            // A profile alone would not restore a session
            if let Err(restore) =
                storage::save(self.storage.as_ref(), keys::TOKEN, session.token.expose_secret())
            {
                warn!(error = %restore, "Failed to restore token after failed logout");
            }
            return Err(e.into());
        }

        self.session = None;
        self.state = AuthState::Anonymous;
        clear_sentry_user();
        info!("Logged out");
        self.observers.notify(&SessionEvent::LoggedOut);
        Ok(())
    }

    /// Observe logins and logouts.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&SessionEvent) + Send + 'static,
    {
        self.observers.subscribe(callback)
    }

    /// Stop observing.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn ensure_anonymous(&self) -> Result<(), AuthError> {
        match &self.session {
            Some(session) => Err(AuthError::AlreadyAuthenticated(
                session.profile.display_name().to_string(),
            )),
            None => Ok(()),
        }
    }

    /// Turn the remote outcome into a session, falling back to a local one
    /// when allowed, and persist it.
    fn settle(
        &mut self,
        attempt: Result<AuthResponse, ApiError>,
        offline_profile: impl FnOnce() -> UserProfile,
    ) -> Result<BestEffort<Session>, AuthError> {
        let outcome = match attempt {
            Ok(response) => Ok(Session {
                profile: response.user,
                token: response.token,
                origin: SessionOrigin::Remote,
            }),
            Err(cause) if self.offline_login => {
                warn!(error = %cause, "Auth backend unavailable, creating local session");
                Err(LocalFallback {
                    value: Session {
                        profile: offline_profile(),
                        token: local_token(),
                        origin: SessionOrigin::Local,
                    },
                    cause,
                })
            }
            Err(cause) => {
                self.state = AuthState::Anonymous;
                return Err(AuthError::Remote(cause));
            }
        };

        let session = match &outcome {
            Ok(session) | Err(LocalFallback { value: session, .. }) => session,
        };
        if let Err(e) = self.establish(session) {
            self.state = AuthState::Anonymous;
            return Err(e);
        }
        Ok(outcome)
    }

    fn establish(&mut self, session: &Session) -> Result<(), AuthError> {
        let document = ProfileDocument {
            profile: session.profile.clone(),
            origin: session.origin,
        };

        storage::save(self.storage.as_ref(), keys::TOKEN, session.token.expose_secret())?;
        if let Err(e) = storage::save(self.storage.as_ref(), keys::USER_PROFILE, &document) {
            // A token alone would not restore a session
            let _ = self.storage.remove(keys::TOKEN);
            return Err(e.into());
        }

        self.session = Some(session.clone());
        self.state = AuthState::Authenticated;

        let profile = &session.profile;
        set_sentry_user(&sentry_id(profile), profile.email.as_ref().map(|e| e.as_str()));
        info!(name = %profile.display_name(), local = session.is_local(), "Logged in");
        self.observers.notify(&SessionEvent::LoggedIn {
            name: profile.display_name().to_string(),
            local: session.is_local(),
        });
        Ok(())
    }
}

/// Profile synthesized from the login form.
fn offline_login_profile(credentials: &Credentials) -> UserProfile {
    let (email, document) = match &credentials.login {
        LoginId::Email(email) => (Some(email.clone()), None),
        LoginId::Document(document) => (None, Some(document.clone())),
    };
    UserProfile {
        id: None,
        name: email
            .as_ref()
            .map(|e| e.local_part().to_string())
            .unwrap_or_default(),
        email,
        phone: credentials.phone.clone(),
        document,
        tier: PriceTier::default(),
    }
}

/// `local-` followed by random alphanumerics.
fn local_token() -> SecretString {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(LOCAL_TOKEN_LENGTH)
        .map(char::from)
        .collect();
    SecretString::from(format!("{LOCAL_TOKEN_PREFIX}{suffix}"))
}

fn sentry_id(profile: &UserProfile) -> String {
    profile
        .id
        .as_ref()
        .map(ToString::to_string)
        .or_else(|| profile.email.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| "local".to_string())
}
