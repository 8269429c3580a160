// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Public-Key Registry
//!
//! Maps user_id → PEM-encoded RSA public key. Intentionally simple: last
//! registration wins, no PKI. The PEM must at least parse as an RSA public
//! key; senders will encrypt against it.

use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::errors::ApiError;
use crate::models::PublicKeyRegistry;
use crate::storage::{Document, DocumentStore};

/// Body of `POST /keys/register`
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterKeyRequest {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub public_key: String,
}

/// Wire shape of a registry lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserKey {
    pub user_id: String,
    pub public_key: String,
}

/// Handle over the registry document
#[derive(Clone)]
pub struct KeyRegistry {
    store: DocumentStore,
}

impl KeyRegistry {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Register or replace a user's public key
    pub async fn register(&self, request: &RegisterKeyRequest) -> Result<(), ApiError> {
        let user_id = request.user_id.trim().to_string();
        let public_key = request.public_key.trim().to_string();

        if user_id.is_empty() || public_key.is_empty() {
            return Err(ApiError::InvalidRequest(
                "user_id and public_key are required and must be non-empty".to_string(),
            ));
        }

        if RsaPublicKey::from_public_key_pem(&public_key).is_err() {
            return Err(ApiError::InvalidRequest(
                "public_key is not a valid RSA public key PEM".to_string(),
            ));
        }

        self.store
            .mutate(
                Document::PublicKeys,
                move |registry: &mut PublicKeyRegistry| {
                    registry.insert(user_id, public_key);
                },
            )
            .await?;

        info!("🔑 Public key registered for user '{}'", request.user_id.trim());
        Ok(())
    }

    /// Look up a user's public key
    pub async fn lookup(&self, user_id: &str) -> Result<UserKey, ApiError> {
        let registry: PublicKeyRegistry = self.store.load(Document::PublicKeys).await?;

        registry
            .get(user_id)
            .map(|pem| UserKey {
                user_id: user_id.to_string(),
                public_key: pem.clone(),
            })
            .ok_or_else(|| {
                ApiError::NotFound(format!("no public key registered for user '{}'", user_id))
            })
    }
}
