//! Integration test harness for the storefront core.
//!
//! [`FakeBackend`] serves the storefront HTTP API on a random local port
//! from a fixed catalog and records every request it receives, so tests
//! can drive an `AppState` end to end and then inspect the wire traffic.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p preciosa-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};
use url::Url;

use preciosa_storefront::AppState;
use preciosa_storefront::config::{CheckoutPolicy, StorefrontConfig};
use preciosa_storefront::services::checkout::{LinkOpener, OpenLinkError};
use preciosa_storefront::storage::{MemoryStorage, SharedStorage};

/// Password the fake backend accepts.
pub const PASSWORD: &str = "segredo";

/// Token issued on successful login.
pub const TOKEN: &str = "tok-123";

/// Backend id of the fixture buyer.
pub const USER_ID: &str = "u1";

/// A request as the fake backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

#[derive(Default)]
struct Shared {
    requests: Mutex<Vec<RecordedRequest>>,
    auth_down: AtomicBool,
    orders_down: AtomicBool,
}

/// In-process stand-in for the storefront backend.
pub struct FakeBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let app = Router::new().fallback(handle).with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        Ok(Self { addr, shared, task })
    }

    /// Base URL to configure the storefront with.
    ///
    /// # Errors
    ///
    /// Returns an error if the bound address does not form a URL.
    pub fn url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!("http://{}", self.addr))
    }

    /// Make the auth endpoints answer 500.
    pub fn set_auth_down(&self, down: bool) {
        self.shared.auth_down.store(down, Ordering::SeqCst);
    }

    /// Make order creation answer 503.
    pub fn set_orders_down(&self, down: bool) {
        self.shared.orders_down.store(down, Ordering::SeqCst);
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for `path`.
    #[must_use]
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Storefront configuration pointing at this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the bound address does not form a URL.
    pub fn config(&self, policy: CheckoutPolicy) -> Result<StorefrontConfig, url::ParseError> {
        let mut config = StorefrontConfig::new(self.url()?);
        config.checkout_policy = policy;
        Ok(config)
    }

    /// App state over fresh in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be built.
    pub fn state(&self, policy: CheckoutPolicy) -> Result<AppState, Box<dyn std::error::Error>> {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        Ok(AppState::with_storage(self.config(policy)?, storage)?)
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Records the links it is asked to open, optionally failing.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    pub opened: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingOpener {
    /// An opener that refuses every link.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) -> Result<(), OpenLinkError> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        if self.fail {
            Err(OpenLinkError("no handler".into()))
        } else {
            Ok(())
        }
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// The fixture catalog, in backend wire format.
#[must_use]
pub fn catalog() -> Vec<Value> {
    vec![
        json!({
            "id": "P001",
            "nome": "Blusa Lírio",
            "sku": "PM-001",
            "categoria": "blusas",
            "preco_atacado": 40.0,
            "preco_varejo": 45.0,
            "tamanhos": ["P", "M", "G"],
            "cores": ["Branco"],
            "imagens": ["https://cdn.example.com/p001.jpg"],
            "descricao": "Blusa em viscose.",
            "estoque": 12,
            "disponivel": true,
            "destaque": true
        }),
        json!({
            "id": "P002",
            "nome": "Vestido Aurora",
            "categoria": "vestidos",
            "preco_atacado": 40.0,
            "preco_varejo": 55.0,
            "descricao": "Vestido midi.",
            "estoque": 4
        }),
        json!({
            "id": "P003",
            "nome": "Conjunto Safira",
            "sku": "PM-003",
            "categoria": "conjuntos",
            "preco_atacado": 95.0,
            "preco_varejo": 120.0,
            "estoque": 0,
            "disponivel": false
        }),
    ]
}

fn fixture_user() -> Value {
    json!({
        "id": USER_ID,
        "nome": "Ana Souza",
        "email": "ana@example.com",
        "telefone": "75999990000",
        "tipo": "varejo"
    })
}

// =============================================================================
// Handler
// =============================================================================

async fn handle(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: serde_json::from_slice(&body).ok(),
    };
    shared
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request.clone());

    let segments: Vec<&str> = uri.path().trim_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (Method::GET, ["api", "products"]) => list_products(request.query.as_deref()),
        (Method::GET, ["api", "products", id]) => get_product(id),
        (Method::POST, ["api", "auth", "login"]) => login(&shared, request.body.as_ref()),
        (Method::POST, ["api", "auth", "register"]) => register(&shared, request.body.as_ref()),
        (Method::POST, ["api", "orders"]) => create_order(&shared, request.body.as_ref()),
        (Method::GET, ["api", "orders", "user", user]) => {
            user_orders(user, request.authorization.as_deref())
        }
        _ => detail(StatusCode::NOT_FOUND, "Not Found"),
    }
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn list_products(query: Option<&str>) -> Response {
    let pairs: Vec<(String, String)> = query
        .map(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .into_owned()
                .collect()
        })
        .unwrap_or_default();
    let param = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    };
    let category = param("categoria");
    let featured = param("destaque").map(|v| v == "true");

    let products: Vec<Value> = catalog()
        .into_iter()
        .filter(|p| category.as_deref().is_none_or(|c| p["categoria"] == c))
        .filter(|p| {
            featured.is_none_or(|f| p["destaque"].as_bool().unwrap_or(false) == f)
        })
        .collect();
    Json(products).into_response()
}

fn get_product(id: &str) -> Response {
    catalog()
        .into_iter()
        .find(|p| p["id"] == id)
        .map_or_else(
            || detail(StatusCode::NOT_FOUND, "Produto não encontrado"),
            |p| Json(p).into_response(),
        )
}

fn login(shared: &Shared, body: Option<&Value>) -> Response {
    if shared.auth_down.load(Ordering::SeqCst) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Serviço indisponível");
    }
    let Some(body) = body else {
        return detail(StatusCode::BAD_REQUEST, "Corpo inválido");
    };
    let known = body["email"] == "ana@example.com" || body["cpf_cnpj"] == "12345678901";
    if known && body["password"] == PASSWORD {
        Json(json!({ "token": TOKEN, "user": fixture_user() })).into_response()
    } else {
        detail(StatusCode::UNAUTHORIZED, "Credenciais inválidas")
    }
}

fn register(shared: &Shared, body: Option<&Value>) -> Response {
    if shared.auth_down.load(Ordering::SeqCst) {
        return detail(StatusCode::INTERNAL_SERVER_ERROR, "Serviço indisponível");
    }
    let Some(body) = body else {
        return detail(StatusCode::BAD_REQUEST, "Corpo inválido");
    };
    Json(json!({
        "token": "tok-new",
        "user": {
            "id": "u2",
            "name": body["name"],
            "email": body["email"],
            "tipo": body["tipo"]
        }
    }))
    .into_response()
}

fn create_order(shared: &Shared, body: Option<&Value>) -> Response {
    if shared.orders_down.load(Ordering::SeqCst) {
        return detail(StatusCode::SERVICE_UNAVAILABLE, "Banco indisponível");
    }
    let Some(body) = body else {
        return detail(StatusCode::BAD_REQUEST, "Corpo inválido");
    };
    Json(json!({
        "id": "srv-1",
        "total": body["total"],
        "status": "pendente",
        "channel": body["channel"],
        "payment_method": body["payment_method"],
        "created_at": body["created_at"],
        "items": body["items"]
    }))
    .into_response()
}

fn user_orders(user: &str, authorization: Option<&str>) -> Response {
    let expected = format!("Bearer {TOKEN}");
    if authorization != Some(expected.as_str()) {
        return detail(StatusCode::UNAUTHORIZED, "Token inválido");
    }
    if user != USER_ID {
        return Json(Vec::<Value>::new()).into_response();
    }
    Json(json!([{
        "id": "srv-9",
        "total": 120.0,
        "status": "enviado",
        "metodo_pagamento": "boleto",
        "created_at": 1_740_830_400_000_i64,
        "channel": "whatsapp",
        "produtos": [{
            "product_id": "P003",
            "sku": "PM-003",
            "nome": "Conjunto Safira",
            "quantidade": 1,
            "preco_unitario": 120.0,
            "tipo": "varejo"
        }]
    }]))
    .into_response()
}
