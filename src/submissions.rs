// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Anonymous Submission Pipeline
//!
//! Admission path for anonymous content:
//!
//! 1. Proof-of-work check (anti-spam, one hash for the server)
//! 2. Commitment consumed atomically: one submission per identity, and the
//!    server never learns who
//! 3. Fresh DEK, AES-EAX encryption, DEK wrapped under the vault KEK
//! 4. Sequential `msg_id` allocated under the submissions-document lock
//! 5. Proof-of-existence hash appended to the proof log
//!
//! Lock order across documents: commitments → submissions → proofs.
//!
//! A failure after step 2 leaves the commitment consumed. That is
//! deliberate: fail-closed against replay beats retriability.
//!
//! The read path decrypts while the wrapped DEK is alive and answers 410
//! Gone forever after data death.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::errors::ApiError;
use crate::crypto::{aes_eax, merkle, pow, EncryptedPayload};
use crate::models::{
    next_msg_id, CommitmentSet, ProofEntry, ProofLog, SubmissionRecord, Submissions,
};
use crate::storage::{Document, DocumentStore};
use crate::vault::Vault;

/// Body of `POST /auth/submit`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub commitment: String,
    #[serde(default)]
    pub nonce: String,
}

/// Receipt returned on accepted submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub status: String,
    pub msg_id: String,
    pub expiry: DateTime<Utc>,
}

/// Decrypted submission returned by the read path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionContent {
    pub msg_id: String,
    pub data: String,
    pub expiry: DateTime<Utc>,
}

/// Handle over the admission and read paths
#[derive(Clone)]
pub struct SubmissionService {
    store: DocumentStore,
    vault: Vault,
    key_expiry_minutes: i64,
    pow_difficulty: usize,
}

impl SubmissionService {
    pub fn new(
        store: DocumentStore,
        vault: Vault,
        key_expiry_minutes: i64,
        pow_difficulty: usize,
    ) -> Self {
        Self {
            store,
            vault,
            key_expiry_minutes,
            pow_difficulty,
        }
    }

    /// Admit an anonymous submission (§ admission pipeline above)
    pub async fn submit(&self, request: &SubmissionRequest) -> Result<SubmissionReceipt, ApiError> {
        // 1. All three fields present and non-empty
        if request.data.is_empty() || request.commitment.is_empty() || request.nonce.is_empty() {
            return Err(ApiError::InvalidRequest(
                "data, commitment and nonce are required and must be non-empty".to_string(),
            ));
        }

        // 2. Proof-of-work before the commitment set is touched
        debug!("🔍 Verifying PoW for commitment {}", request.commitment);
        if !pow::verify(&request.commitment, &request.nonce, self.pow_difficulty) {
            warn!("❌ PoW failed for commitment {}", request.commitment);
            return Err(ApiError::PowFailed);
        }

        // 3. Consume the commitment: membership check and insert are one
        //    atomic step under the commitments lock
        let commitment = request.commitment.clone();
        let inserted = self
            .store
            .mutate_if(Document::Commitments, move |set: &mut CommitmentSet| {
                let inserted = set.insert(commitment);
                (inserted, inserted)
            })
            .await?;
        if !inserted {
            warn!("❌ Duplicate commitment rejected: {}", request.commitment);
            return Err(ApiError::DuplicateCommitment);
        }

        // 4.–6. Fresh DEK, seal the plaintext, wrap the DEK under the KEK
        let dek = aes_eax::generate_dek();
        let sealed = aes_eax::encrypt(&dek, request.data.as_bytes())?;
        let wrapped = aes_eax::wrap_dek(self.vault.kek(), &dek)?;

        // 7.–9. Allocate msg_id and persist, all under the submissions lock
        let created_at = Utc::now();
        let expiry = created_at + Duration::minutes(self.key_expiry_minutes);
        let record = SubmissionRecord {
            ciphertext: sealed.ciphertext,
            nonce: sealed.nonce,
            tag: sealed.tag,
            wrapped_dek: Some(wrapped),
            commitment: request.commitment.clone(),
            created_at,
            expiry,
        };

        let msg_id = self
            .store
            .mutate(Document::Submissions, move |submissions: &mut Submissions| {
                let msg_id = next_msg_id(submissions);
                submissions.insert(msg_id.clone(), record);
                msg_id
            })
            .await?;

        // 10. Proof-of-existence: hash only, never plaintext, no signature
        //     for anonymous submissions
        let entry = ProofEntry {
            id: msg_id.clone(),
            data_hash: merkle::hash_leaf(&request.data),
            signature: None,
            created_at,
        };
        self.store
            .mutate(Document::Proofs, move |log: &mut ProofLog| log.push(entry))
            .await?;

        info!("✅ Submission {} accepted, expires {}", msg_id, expiry);
        Ok(SubmissionReceipt {
            status: "accepted".to_string(),
            msg_id,
            expiry,
        })
    }

    /// Decrypt and return a submission while its DEK is alive
    pub async fn read(&self, msg_id: &str) -> Result<SubmissionContent, ApiError> {
        let submissions: Submissions = self.store.load(Document::Submissions).await?;

        let record = submissions.get(msg_id).ok_or_else(|| {
            ApiError::NotFound(format!("no submission with msg_id '{}'", msg_id))
        })?;

        let gone = ApiError::Gone {
            msg_id: msg_id.to_string(),
            expiry: Some(record.expiry),
        };

        // Deadline passed counts as dead even before the sweeper gets there
        let Some(wrapped) = &record.wrapped_dek else {
            return Err(gone);
        };
        if record.is_expired(Utc::now()) {
            return Err(gone);
        }

        let dek = aes_eax::unwrap_dek(self.vault.kek(), wrapped)?;
        let payload = EncryptedPayload {
            ciphertext: record.ciphertext.clone(),
            nonce: record.nonce.clone(),
            tag: record.tag.clone(),
        };
        let plaintext = aes_eax::decrypt(&dek, &payload)?;
        let data = String::from_utf8(plaintext)
            .map_err(|e| ApiError::Internal(format!("stored plaintext is not UTF-8: {}", e)))?;

        Ok(SubmissionContent {
            msg_id: msg_id.to_string(),
            data,
            expiry: record.expiry,
        })
    }
}
