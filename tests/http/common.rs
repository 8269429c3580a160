//! Shared fixtures: a full router wired over a temporary storage root,
//! plus request helpers for driving it with `tower::ServiceExt::oneshot`

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use fabstir_drop_node::api::http_server::{create_app, AppState};
use fabstir_drop_node::chat::ChatService;
use fabstir_drop_node::config::NodeConfig;
use fabstir_drop_node::crypto::{commitment, pow};
use fabstir_drop_node::expiry::ExpirySweeper;
use fabstir_drop_node::registry::KeyRegistry;
use fabstir_drop_node::storage::DocumentStore;
use fabstir_drop_node::submissions::SubmissionService;
use fabstir_drop_node::vault::Vault;
use fabstir_drop_node::verification::VerificationService;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

/// PoW difficulty baked into every test app; solvable in a few hundred
/// hashes
pub const TEST_DIFFICULTY: usize = 2;

pub struct TestApp {
    // held so the storage root outlives the router
    pub dir: TempDir,
    pub app: Router,
}

/// Wire a complete router over a fresh tempdir
pub fn app(admin_token: Option<&str>, key_expiry_minutes: i64) -> TestApp {
    let dir = tempfile::tempdir().unwrap();

    let config = Arc::new(NodeConfig {
        admin_token: admin_token.map(str::to_string),
        key_expiry_minutes,
        pow_difficulty: TEST_DIFFICULTY,
        storage_dir: dir.path().to_path_buf(),
        sweep_interval: Duration::from_secs(60),
        api_port: 0,
    });

    let store = DocumentStore::open(dir.path()).unwrap();
    let vault = Vault::bootstrap(&dir.path().join("vault")).unwrap();
    let signer = vault.signer();

    let state = AppState {
        config: config.clone(),
        store: store.clone(),
        submissions: SubmissionService::new(
            store.clone(),
            vault.clone(),
            config.key_expiry_minutes,
            config.pow_difficulty,
        ),
        chat: ChatService::new(store.clone(), signer.clone(), config.key_expiry_minutes),
        registry: KeyRegistry::new(store.clone()),
        verification: VerificationService::new(store.clone(), signer.clone()),
        sweeper: ExpirySweeper::new(store, config.sweep_interval),
        signer,
    };

    TestApp {
        dir,
        app: create_app(state),
    }
}

/// Fire one request and return `(status, parsed JSON body)`
pub async fn request(
    app: &Router,
    method: Method,
    path: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    request(app, Method::GET, path, None, None).await
}

pub async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    request(app, Method::POST, path, None, Some(body)).await
}

/// A valid `/auth/submit` body for `data` under a fresh identity
pub fn solved_submission_body(data: &str) -> Value {
    let secret = commitment::generate_identity_secret();
    let commitment = commitment::commitment_from_secret(&secret);
    let nonce = pow::solve(&commitment, TEST_DIFFICULTY);

    json!({
        "data": data,
        "commitment": commitment,
        "nonce": nonce,
    })
}
