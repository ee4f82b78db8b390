#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine as _;
use chrono::Utc;
use client::{ApiClient, Credential, Profile, TokenStore};
use engine::store::{KeyValueStore, MemoryStore};
use serde_json::{Value, json};

pub const REFRESH_TOKEN: &str = "refresh-1";

/// Behaviour and call log of the mocked API.
#[derive(Default)]
pub struct MockApi {
    pub refreshes: AtomicUsize,
    pub reject_all: AtomicBool,
    pub login_body: Mutex<Value>,
    pub posted: Mutex<Vec<Value>>,
    /// Operations whose creation answers 500.
    pub failing_operations: Mutex<Vec<String>>,
    pub estimations_down: AtomicBool,
    pub estimation_puts: Mutex<Vec<(String, Value)>>,
}

impl MockApi {
    pub fn posted(&self) -> Vec<Value> {
        self.posted.lock().unwrap().clone()
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

pub fn token(exp: i64, sub: &str) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = engine.encode(json!({ "sub": sub, "exp": exp }).to_string());
    format!("{header}.{claims}.signature")
}

pub fn fresh_token() -> String {
    token(Utc::now().timestamp() + 3600, "user-1")
}

pub fn expired_token() -> String {
    token(Utc::now().timestamp() - 60, "user-1")
}

/// Store holding a signed-in user with the given access token.
pub fn signed_in_store(access_token: &str, refresh_token: &str) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    TokenStore::new(store.clone())
        .save(&Credential {
            access_token: access_token.to_string(),
            refresh_token: refresh_token.to_string(),
            profile: Profile {
                id: "user-1".to_string(),
                email: Some("user@example.org".to_string()),
                display_name: Some("User".to_string()),
                is_admin: false,
            },
        })
        .unwrap();
    store
}

pub fn client(base_url: &str, store: Arc<dyn KeyValueStore>) -> ApiClient {
    ApiClient::new(base_url, store)
}

fn authorized(api: &MockApi, headers: &HeaderMap) -> bool {
    !api.reject_all.load(Ordering::SeqCst)
        && headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("Bearer "))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "token rejected" })),
    )
        .into_response()
}

async fn login(State(api): State<Arc<MockApi>>) -> Json<Value> {
    Json(api.login_body.lock().unwrap().clone())
}

async fn refresh(State(api): State<Arc<MockApi>>, Json(body): Json<Value>) -> Response {
    api.refreshes.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(20)).await;
    if body["refreshToken"] != REFRESH_TOKEN {
        return unauthorized();
    }
    Json(json!({ "token": fresh_token(), "refreshToken": "refresh-2" })).into_response()
}

async fn list_transactions(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !authorized(&api, &headers) {
        return unauthorized();
    }
    Json(json!([
        { "id": 1, "operation": "CB CARREFOUR", "date": "2024-03-02", "type": "DEBIT", "valeur": 42.5,
          "categorie": { "id": 1, "name": "Groceries" } },
        { "id": 2, "operation": "VIR SALAIRE", "date": "2024-03-28T00:00:00", "type": "CREDIT", "valeur": 2100 },
        { "id": 3, "operation": "VIR INTERNE", "date": "2024-03-29", "type": "TRANSFER", "valeur": 10 }
    ]))
    .into_response()
}

async fn create_transaction(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&api, &headers) {
        return unauthorized();
    }
    let operation = body["operation"].as_str().unwrap_or_default().to_string();
    if api.failing_operations.lock().unwrap().contains(&operation) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "database unavailable" })),
        )
            .into_response();
    }
    let mut posted = api.posted.lock().unwrap();
    posted.push(body);
    (StatusCode::CREATED, Json(json!({ "id": posted.len() }))).into_response()
}

async fn parse_statement(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !authorized(&api, &headers) {
        return unauthorized();
    }
    let multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    if !multipart {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "pdfFile is required" })),
        )
            .into_response();
    }
    Json(json!({
        "account": "FR76 0000 0000 0000",
        "transactions": [
            { "dateOperation": "03/01/2024", "libelle": "CB CARREFOUR MARKET", "debit": -45.2, "page": 1 },
            { "dateOperation": "05/01", "dateValeur": "06/01/24", "libelle": "VIR SALAIRE", "credit": 2100.0, "page": 1 },
            { "dateOperation": "07/01/24", "libelle": "PRLV EDF", "debit": 60.0, "reference": "EDF-123", "page": 2 }
        ]
    }))
    .into_response()
}

async fn categories(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !authorized(&api, &headers) {
        return unauthorized();
    }
    Json(json!([
        { "id": 1, "name": "Groceries" },
        { "id": 2, "name": "Salary" },
        { "id": 3, "name": "Energy" }
    ]))
    .into_response()
}

async fn estimations(State(api): State<Arc<MockApi>>, headers: HeaderMap) -> Response {
    if !authorized(&api, &headers) {
        return unauthorized();
    }
    if api.estimations_down.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "estimations unavailable" })),
        )
            .into_response();
    }
    Json(json!([
        { "id": 1, "name": "Groceries", "estimationDepenses": 0, "estimationRevenus": 0 },
        { "id": 2, "name": "Salary", "estimationDepenses": 0, "estimationRevenus": 2500 },
        { "id": 3, "name": "Energy", "estimationDepenses": 900, "estimationRevenus": 0 }
    ]))
    .into_response()
}

async fn put_estimations(
    State(api): State<Arc<MockApi>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&api, &headers) {
        return unauthorized();
    }
    api.estimation_puts.lock().unwrap().push((id, body.clone()));
    Json(body).into_response()
}

async fn category_estimations(
    State(api): State<Arc<MockApi>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&api, &headers) {
        return unauthorized();
    }
    let saved = api
        .estimation_puts
        .lock()
        .unwrap()
        .iter()
        .rev()
        .find(|(put_id, _)| *put_id == id)
        .map(|(_, body)| body.clone());
    Json(saved.unwrap_or_else(|| json!({ "estimationDepenses": 0, "estimationRevenus": 0 })))
        .into_response()
}

pub fn router(api: Arc<MockApi>) -> Router {
    Router::new()
        .route("/user/login", post(login))
        .route("/user/refresh", post(refresh))
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/parse-ccf", post(parse_statement))
        .route("/categories", get(categories))
        .route("/categories/estimations", get(estimations))
        .route(
            "/categories/{id}/estimations",
            get(category_estimations).put(put_estimations),
        )
        .with_state(api)
}

/// Serves the mock on an ephemeral port and returns its base URL.
pub async fn spawn(api: Arc<MockApi>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(api)).await.unwrap();
    });
    format!("http://{addr}")
}

/// A minimal PDF-looking upload.
pub fn pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF".to_vec()
}
