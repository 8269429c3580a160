// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! End-to-End Encrypted Chat Pipeline
//!
//! The server is a dumb, attesting mailbox: senders encrypt the message and
//! its symmetric key against the recipient's registered public key on the
//! client; the node stores the two opaque blobs, hashes the ciphertext,
//! signs the hash with the persistent server key, and schedules expiry.
//! It can never read a message, and after expiry neither can anyone else.
//!
//! Chat senders are not authenticated; the chat layer is
//! anonymous-to-recipient.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::crypto::ProofSigner;
use crate::models::{ChatMessages, ChatRecord, ProofEntry, ProofLog, PublicKeyRegistry};
use crate::storage::{Document, DocumentStore};
use std::sync::Arc;

/// Body of `POST /chat/send`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatSendRequest {
    #[serde(default)]
    pub encrypted_message: String,
    #[serde(default)]
    pub encrypted_key: String,
    #[serde(default)]
    pub receiver: String,
}

/// Receipt returned on stored message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReceipt {
    pub message_id: String,
    pub expiry: DateTime<Utc>,
}

/// Handle over the chat send and inbox paths
#[derive(Clone)]
pub struct ChatService {
    store: DocumentStore,
    signer: Arc<ProofSigner>,
    key_expiry_minutes: i64,
}

impl ChatService {
    pub fn new(store: DocumentStore, signer: Arc<ProofSigner>, key_expiry_minutes: i64) -> Self {
        Self {
            store,
            signer,
            key_expiry_minutes,
        }
    }

    /// Store an encrypted message with a signed proof-of-existence
    pub async fn send(&self, request: &ChatSendRequest) -> Result<ChatReceipt, ApiError> {
        if request.encrypted_message.is_empty()
            || request.encrypted_key.is_empty()
            || request.receiver.is_empty()
        {
            return Err(ApiError::InvalidRequest(
                "encrypted_message, encrypted_key and receiver are required and must be non-empty"
                    .to_string(),
            ));
        }

        // Receiver must have a registered public key; the sender encrypted
        // against it, an unknown receiver means an undeliverable blob
        let registry: PublicKeyRegistry = self.store.load(Document::PublicKeys).await?;
        if !registry.contains_key(&request.receiver) {
            return Err(ApiError::NotFound(format!(
                "no public key registered for user '{}'",
                request.receiver
            )));
        }

        let message_id = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expiry = created_at + Duration::minutes(self.key_expiry_minutes);

        // Proof-of-existence over the ciphertext the server actually stores
        let data_hash = hex::encode(Sha256::digest(request.encrypted_message.as_bytes()));
        let signature = self.signer.sign(data_hash.as_bytes())?;
        debug!("🖊️ Signed data_hash {} for message {}", data_hash, message_id);

        let record = ChatRecord {
            encrypted_message: Some(request.encrypted_message.clone()),
            encrypted_key: Some(request.encrypted_key.clone()),
            receiver: request.receiver.clone(),
            created_at,
            expiry,
            expired: false,
        };
        let id = message_id.clone();
        self.store
            .mutate(Document::ChatMessages, move |messages: &mut ChatMessages| {
                messages.insert(id, record);
            })
            .await?;

        let entry = ProofEntry {
            id: message_id.clone(),
            data_hash,
            signature: Some(signature),
            created_at,
        };
        self.store
            .mutate(Document::Proofs, move |log: &mut ProofLog| log.push(entry))
            .await?;

        info!(
            "✅ Chat message {} stored for {}, expires {}",
            message_id, request.receiver, expiry
        );
        Ok(ChatReceipt { message_id, expiry })
    }

    /// All messages addressed to `user_id`, expired ones included but
    /// flagged and stripped of their blobs
    pub async fn inbox(&self, user_id: &str) -> Result<ChatMessages, ApiError> {
        let messages: ChatMessages = self.store.load(Document::ChatMessages).await?;

        Ok(messages
            .into_iter()
            .filter(|(_, record)| record.receiver == user_id)
            .collect())
    }
}
