// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP Surface
//!
//! Thin axum layer over the core services. Routing, JSON (de)serialization
//! and status mapping live here; every behavior worth testing lives in the
//! services.

use axum::{
    extract::{Json, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::errors::ApiError;
use crate::chat::{ChatSendRequest, ChatService};
use crate::config::NodeConfig;
use crate::crypto::{commitment, ProofSigner};
use crate::expiry::ExpirySweeper;
use crate::models::{CommitmentSet, ProofLog, Submissions};
use crate::registry::{KeyRegistry, RegisterKeyRequest};
use crate::storage::{Document, DocumentStore};
use crate::submissions::{SubmissionRequest, SubmissionService};
use crate::verification::VerificationService;

/// Shared handler state: the core service handles plus the raw store for
/// admin dumps
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<NodeConfig>,
    pub store: DocumentStore,
    pub submissions: SubmissionService,
    pub chat: ChatService,
    pub registry: KeyRegistry,
    pub verification: VerificationService,
    pub sweeper: ExpirySweeper,
    pub signer: Arc<ProofSigner>,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Anonymous submission
        .route("/auth/identity", post(identity_handler))
        .route("/auth/submit", post(submit_handler))
        .route("/auth/read/:msg_id", get(read_handler))
        // E2E chat
        .route("/chat/send", post(chat_send_handler))
        .route("/chat/inbox/:user_id", get(inbox_handler))
        // Public-key registry
        .route("/keys/register", post(register_key_handler))
        .route("/keys/server/pubkey", get(server_pubkey_handler))
        .route("/keys/:user_id", get(get_key_handler))
        // Proof-of-existence verification
        .route("/verify/root", get(verify_root_handler))
        .route("/verify/hash", post(verify_hash_handler))
        .route("/verify/proof/:id", get(verify_proof_handler))
        .route("/verify/signature", post(verify_signature_handler))
        // Admin diagnostics
        .route("/admin/submissions", get(admin_submissions_handler))
        .route("/admin/proofs", get(admin_proofs_handler))
        .route("/admin/commitments", get(admin_commitments_handler))
        .route("/admin/stats", get(admin_stats_handler))
        .route("/admin/expire", post(admin_expire_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = ([0, 0, 0, 0], state.config.api_port).into();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("🌐 API server listening on {}", addr);

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

async fn health_handler() -> impl IntoResponse {
    axum::response::Json(json!({ "status": "ok" }))
}

// ── Anonymous submission ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct IdentityResponse {
    identity_secret: String,
    nullifier: String,
    commitment: String,
    instructions: String,
}

/// Diagnostic convenience only; real clients derive the chain locally and
/// never let the secret leave the device
async fn identity_handler() -> impl IntoResponse {
    let identity_secret = commitment::generate_identity_secret();
    let nullifier = commitment::derive_nullifier(&identity_secret);
    let commitment = commitment::derive_commitment(&nullifier);

    axum::response::Json(IdentityResponse {
        identity_secret,
        nullifier,
        commitment,
        instructions: "Store identity_secret locally. Submit commitment + PoW nonce to \
                       /auth/submit. Never send identity_secret to the server."
            .to_string(),
    })
}

async fn submit_handler(
    State(state): State<AppState>,
    Json(request): Json<SubmissionRequest>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let receipt = state.submissions.submit(&request).await?;
    Ok((StatusCode::CREATED, axum::response::Json(receipt)))
}

async fn read_handler(
    State(state): State<AppState>,
    Path(msg_id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let content = state.submissions.read(&msg_id).await?;
    Ok(axum::response::Json(content))
}

// ── E2E chat ────────────────────────────────────────────────────────────

async fn chat_send_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatSendRequest>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let receipt = state.chat.send(&request).await?;
    Ok((StatusCode::CREATED, axum::response::Json(receipt)))
}

async fn inbox_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let inbox = state.chat.inbox(&user_id).await?;
    Ok(axum::response::Json(inbox))
}

// ── Public-key registry ─────────────────────────────────────────────────

async fn register_key_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterKeyRequest>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    state.registry.register(&request).await?;
    Ok((
        StatusCode::CREATED,
        axum::response::Json(json!({
            "status": "registered",
            "user_id": request.user_id.trim(),
        })),
    ))
}

async fn get_key_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let key = state.registry.lookup(&user_id).await?;
    Ok(axum::response::Json(key))
}

/// External verifiers check proof signatures against this key without
/// trusting the server's own verify endpoints
async fn server_pubkey_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::response::Json(json!({
        "public_key_pem": state.signer.public_key_pem(),
    }))
}

// ── Verification ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct HashRequest {
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignatureRequest {
    msg_id: Option<String>,
}

async fn verify_root_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let root = state.verification.root().await?;
    Ok(axum::response::Json(root))
}

async fn verify_hash_handler(
    State(state): State<AppState>,
    Json(request): Json<HashRequest>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let data = request
        .data
        .ok_or_else(|| ApiError::InvalidRequest("data field required".to_string()))?;
    let check = state.verification.check_hash(&data).await?;
    Ok(axum::response::Json(check))
}

async fn verify_proof_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let proof = state.verification.inclusion_proof(&id).await?;
    Ok(axum::response::Json(proof))
}

async fn verify_signature_handler(
    State(state): State<AppState>,
    Json(request): Json<SignatureRequest>,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    let msg_id = request
        .msg_id
        .ok_or_else(|| ApiError::InvalidRequest("msg_id required".to_string()))?;
    let check = state.verification.verify_signature(&msg_id).await?;
    Ok(axum::response::Json(check))
}

// ── Admin ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AdminStats {
    timestamp: chrono::DateTime<Utc>,
    total_submissions: usize,
    active_submissions: usize,
    expired_submissions: usize,
    total_chat_messages: usize,
    total_proofs: usize,
    total_commitments: usize,
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Err(ApiError::AdminDisabled);
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}

/// All stored submissions, ciphertext and envelopes included (never
/// plaintext; the server has none)
async fn admin_submissions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    require_admin(&state, &headers)?;
    let submissions: Submissions = state.store.load(Document::Submissions).await.map_err(ApiError::from)?;
    Ok(axum::response::Json(submissions))
}

async fn admin_proofs_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    require_admin(&state, &headers)?;
    let proofs: ProofLog = state.store.load(Document::Proofs).await.map_err(ApiError::from)?;
    Ok(axum::response::Json(proofs))
}

async fn admin_commitments_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    require_admin(&state, &headers)?;
    let commitments: CommitmentSet = state
        .store
        .load(Document::Commitments)
        .await
        .map_err(ApiError::from)?;
    Ok(axum::response::Json(commitments))
}

async fn admin_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    require_admin(&state, &headers)?;

    let submissions: Submissions = state.store.load(Document::Submissions).await.map_err(ApiError::from)?;
    let messages: crate::models::ChatMessages = state
        .store
        .load(Document::ChatMessages)
        .await
        .map_err(ApiError::from)?;
    let proofs: ProofLog = state.store.load(Document::Proofs).await.map_err(ApiError::from)?;
    let commitments: CommitmentSet = state
        .store
        .load(Document::Commitments)
        .await
        .map_err(ApiError::from)?;

    let expired = submissions
        .values()
        .filter(|record| record.wrapped_dek.is_none())
        .count();

    Ok(axum::response::Json(AdminStats {
        timestamp: Utc::now(),
        total_submissions: submissions.len(),
        active_submissions: submissions.len() - expired,
        expired_submissions: expired,
        total_chat_messages: messages.len(),
        total_proofs: proofs.len(),
        total_commitments: commitments.len(),
    }))
}

/// Immediate sweep outside the scheduler interval
async fn admin_expire_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiErrorResponse> {
    require_admin(&state, &headers)?;

    let destroyed = state
        .sweeper
        .sweep_once()
        .await
        .map_err(ApiError::from)?;

    Ok(axum::response::Json(json!({
        "status": "sweep complete",
        "destroyed": destroyed,
        "timestamp": Utc::now(),
    })))
}

// Error response wrapper
pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        ApiErrorResponse(error)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self.0 {
            tracing::error!("❌ Internal error: {}", detail);
        }

        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status, axum::response::Json(self.0.to_response())).into_response()
    }
}
