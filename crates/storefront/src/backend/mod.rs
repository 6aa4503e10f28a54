//! HTTP client for the storefront backend.
//!
//! # Architecture
//!
//! - One `ApiClient` per process, cheaply cloneable (`Arc` inside)
//! - Every endpoint lives under the configured `/api` root
//! - Catalog responses cached in memory via `moka` (TTL from config)
//! - Calls the storefront may survive without are wrapped in
//!   [`BestEffort`] by the services that make them
//!
//! # Endpoints
//!
//! | method | path | module |
//! |---|---|---|
//! | GET | `/products[?categoria=&destaque=]` | [`catalog`] |
//! | GET | `/products/{id}` | [`catalog`] |
//! | POST | `/auth/login`, `/auth/register` | [`auth`] |
//! | POST | `/orders` | [`orders`] |
//! | GET | `/orders/user/{id}` | [`orders`] |

pub mod auth;
mod cache;
pub mod catalog;
pub mod orders;

pub use auth::{AuthApi, AuthResponse, Credentials, LoginId, Registration};
pub use catalog::CatalogFilter;
pub use orders::{OrderApi, OrderTimestamp, RemoteOrder};

use std::sync::Arc;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::StorefrontConfig;

use cache::{CacheKey, CacheValue};

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Endpoint path could not be joined onto the API root.
    #[error("Invalid endpoint {0}: {1}")]
    Url(String, url::ParseError),
}

impl ApiError {
    /// Whether the backend could not be reached at all.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }
}

/// The value obtained when a remote call fails but the storefront carries on
/// locally, together with the failure that forced it.
#[derive(Debug)]
pub struct LocalFallback<T> {
    pub value: T,
    pub cause: ApiError,
}

/// Outcome of a best-effort remote call: `Ok` when the backend answered,
/// `Err(LocalFallback)` when a local substitute was used instead.
pub type BestEffort<T> = Result<T, LocalFallback<T>>;

/// Helpers for [`BestEffort`] results.
pub trait BestEffortExt<T> {
    /// The value, whichever side produced it.
    fn into_value(self) -> T;

    /// The value, whichever side produced it.
    fn value(&self) -> &T;

    /// Whether the backend produced the value.
    fn is_remote(&self) -> bool;
}

impl<T> BestEffortExt<T> for BestEffort<T> {
    fn into_value(self) -> T {
        self.unwrap_or_else(|fallback| fallback.value)
    }

    fn value(&self) -> &T {
        match self {
            Ok(value) | Err(LocalFallback { value, .. }) => value,
        }
    }

    fn is_remote(&self) -> bool {
        self.is_ok()
    }
}

/// Error body returned by the backend (`{"detail": "..."}`).
#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    detail: String,
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the storefront backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    api_root: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root", &self.inner.api_root.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built, or
    /// `ApiError::Url` if the configured root is not a valid base URL.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        // Trailing slash so relative joins stay under /api
        let root = format!("{}/", config.api_root());
        let api_root = Url::parse(&root).map_err(|e| ApiError::Url(root, e))?;

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                api_root,
                cache,
            }),
        })
    }

    /// Drop every cached catalog response.
    pub fn invalidate_cache(&self) {
        self.inner.cache.invalidate_all();
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .api_root
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Url(path.to_string(), e))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// GET `path` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path, query)?;
        let mut request = self.inner.client.get(url);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        decode(path, request.send().await?).await
    }

    /// POST `body` as JSON to `path` and decode the JSON reply.
    async fn post_json<B, T>(&self, path: &str, body: &B, bearer: Option<&str>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path, &[])?;
        let mut request = self.inner.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        decode(path, request.send().await?).await
    }
}

/// Check the status and parse the body.
async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();

    // Body as text first for better error diagnostics
    let body = response.text().await?;

    if status == reqwest::StatusCode::NOT_FOUND {
        debug!(path, "Backend returned 404");
        return Err(ApiError::NotFound(path.to_string()));
    }

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map_or_else(|_| body.chars().take(200).collect(), |e| e.detail);
        error!(
            status = %status,
            body = %body.chars().take(500).collect::<String>(),
            "Backend returned non-success status"
        );
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}
