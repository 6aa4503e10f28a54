//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PRECIOSA_BACKEND_URL` - Backend base URL (the `/api` prefix is appended)
//!
//! ## Optional
//! - `PRECIOSA_WHATSAPP_PHONE` - Order destination, digits with DDI + DDD
//!   (default: 5575991451074)
//! - `PRECIOSA_BRAND_NAME` - Brand shown in order messages (default: Preciosa Modas)
//! - `PRECIOSA_DATA_DIR` - Local durable storage directory (default: .preciosa)
//! - `PRECIOSA_PRICE_GATING` - Hide prices and block the cart without a session
//!   (default: false)
//! - `PRECIOSA_OFFLINE_LOGIN` - Fall back to a local session when the auth
//!   backend is unreachable (default: true)
//! - `PRECIOSA_ORDER_HISTORY_LIMIT` - Orders kept in the local history (default: 20)
//! - `PRECIOSA_HTTP_TIMEOUT_SECS` - Backend request timeout (default: 10)
//! - `PRECIOSA_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default WhatsApp destination for orders.
pub const DEFAULT_WHATSAPP_PHONE: &str = "5575991451074";

/// Default brand name.
pub const DEFAULT_BRAND_NAME: &str = "Preciosa Modas";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Who may see prices and check out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPolicy {
    /// Prices are public and orders may be placed without logging in.
    #[default]
    GuestAllowed,
    /// Prices, add-to-cart and checkout require a session.
    SessionRequired,
}

impl CheckoutPolicy {
    /// Whether this policy hides prices from anonymous visitors.
    #[must_use]
    pub const fn is_gated(self) -> bool {
        matches!(self, Self::SessionRequired)
    }
}

/// Storefront core configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend base URL, without the `/api` prefix
    pub backend_url: Url,
    /// WhatsApp destination number (digits only, no `+`)
    pub whatsapp_phone: String,
    /// Brand name for message headers
    pub brand_name: String,
    /// Directory holding the durable local storage
    pub data_dir: PathBuf,
    /// Price visibility and guest checkout policy
    pub checkout_policy: CheckoutPolicy,
    /// Whether login/registration degrade to a local session
    pub offline_login: bool,
    /// Maximum number of orders kept locally
    pub order_history_limit: usize,
    /// Timeout applied to every backend request
    pub http_timeout: Duration,
    /// Lifetime of cached catalog responses
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl StorefrontConfig {
    /// Configuration with every optional setting at its default.
    #[must_use]
    pub fn new(backend_url: Url) -> Self {
        Self {
            backend_url,
            whatsapp_phone: DEFAULT_WHATSAPP_PHONE.to_string(),
            brand_name: DEFAULT_BRAND_NAME.to_string(),
            data_dir: PathBuf::from(".preciosa"),
            checkout_policy: CheckoutPolicy::GuestAllowed,
            offline_login: true,
            order_history_limit: 20,
            http_timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
            sentry_dsn: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let backend_url = env.required("PRECIOSA_BACKEND_URL")?;
        let backend_url = parse_backend_url(&backend_url)
            .map_err(|e| ConfigError::InvalidEnvVar("PRECIOSA_BACKEND_URL".to_string(), e))?;

        let whatsapp_phone = env.or_default("PRECIOSA_WHATSAPP_PHONE", DEFAULT_WHATSAPP_PHONE);
        validate_whatsapp_phone(&whatsapp_phone)
            .map_err(|e| ConfigError::InvalidEnvVar("PRECIOSA_WHATSAPP_PHONE".to_string(), e))?;

        let checkout_policy = if env.parsed_bool("PRECIOSA_PRICE_GATING", false)? {
            CheckoutPolicy::SessionRequired
        } else {
            CheckoutPolicy::GuestAllowed
        };

        let order_history_limit: usize = env.parsed("PRECIOSA_ORDER_HISTORY_LIMIT", 20)?;
        if order_history_limit == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "PRECIOSA_ORDER_HISTORY_LIMIT".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            backend_url,
            whatsapp_phone,
            brand_name: env.or_default("PRECIOSA_BRAND_NAME", DEFAULT_BRAND_NAME),
            data_dir: PathBuf::from(env.or_default("PRECIOSA_DATA_DIR", ".preciosa")),
            checkout_policy,
            offline_login: env.parsed_bool("PRECIOSA_OFFLINE_LOGIN", true)?,
            order_history_limit,
            http_timeout: Duration::from_secs(env.parsed("PRECIOSA_HTTP_TIMEOUT_SECS", 10)?),
            catalog_cache_ttl: Duration::from_secs(
                env.parsed("PRECIOSA_CATALOG_CACHE_TTL_SECS", 300)?,
            ),
            sentry_dsn: env.optional("SENTRY_DSN"),
        })
    }

    /// The `/api` root every endpoint hangs off.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api", self.backend_url.as_str().trim_end_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable; blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parsed<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a boolean flag (`true/false`, `1/0`, `yes/no`, `on/off`).
    fn parsed_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        self.optional(key).map_or(Ok(default), |raw| {
            match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                other => Err(ConfigError::InvalidEnvVar(
                    key.to_string(),
                    format!("expected a boolean, got {other:?}"),
                )),
            }
        })
    }
}

fn parse_backend_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(format!("unsupported scheme {scheme:?}")),
    }
}

/// E.164 numbers have at most 15 digits; the `+` is omitted in wa.me links.
fn validate_whatsapp_phone(phone: &str) -> Result<(), String> {
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Err("must contain digits only (no '+', spaces or dashes)".to_string());
    }
    if !(10..=15).contains(&phone.len()) {
        return Err(format!("must have 10 to 15 digits (got {})", phone.len()));
    }
    Ok(())
}
