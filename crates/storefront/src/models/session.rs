//! Session-related types.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::UserProfile;

/// Prefix of tokens minted locally while the backend is unreachable.
pub const LOCAL_TOKEN_PREFIX: &str = "local-";

/// Where a session's token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    /// Issued by the auth API.
    #[default]
    Remote,
    /// Synthesized offline; the backend does not know this token.
    Local,
}

/// An authenticated identity.
///
/// The token is never printed by `Debug`.
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: UserProfile,
    pub token: SecretString,
    pub origin: SessionOrigin,
}

impl Session {
    /// Whether the session was synthesized offline.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.origin == SessionOrigin::Local
    }

    /// The bearer token for backend calls, or `None` for local sessions.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        match self.origin {
            SessionOrigin::Remote => Some(self.token.expose_secret()),
            SessionOrigin::Local => None,
        }
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.profile == other.profile
            && self.origin == other.origin
            && self.token.expose_secret() == other.token.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use preciosa_core::PriceTier;

    use super::*;

    fn session(origin: SessionOrigin) -> Session {
        Session {
            profile: UserProfile {
                id: None,
                name: "Ana".into(),
                email: None,
                phone: None,
                document: None,
                tier: PriceTier::Wholesale,
            },
            token: SecretString::from("tok-123"),
            origin,
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", session(SessionOrigin::Remote));
        assert!(!debug.contains("tok-123"));
    }

    #[test]
    fn test_local_sessions_have_no_bearer() {
        assert_eq!(session(SessionOrigin::Remote).bearer(), Some("tok-123"));
        assert_eq!(session(SessionOrigin::Local).bearer(), None);
        assert!(session(SessionOrigin::Local).is_local());
    }
}
