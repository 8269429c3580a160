// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Proof-of-Existence Verification
//!
//! Read-only views over the proof log. These let anyone confirm that
//! specific content existed at a specific time without accessing the
//! plaintext, which may already be dead.
//!
//! The Merkle tree is recomputed fresh from the proof log on every call;
//! the log's insertion order is the leaf order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::api::errors::ApiError;
use crate::crypto::{merkle, ProofSigner, ProofStep};
use crate::models::{ChatMessages, ProofLog};
use crate::storage::{Document, DocumentStore};

/// Response of `GET /verify/root`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootInfo {
    pub merkle_root: String,
    pub total_submissions: usize,
}

/// Response of `POST /verify/hash`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashCheck {
    pub data_hash: String,
    pub found: bool,
    pub merkle_root: String,
}

/// Response of `GET /verify/proof/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InclusionProof {
    pub msg_id: String,
    pub leaf_hash: String,
    pub created_at: DateTime<Utc>,
    pub merkle_root: String,
    pub proof_path: Vec<ProofStep>,
}

/// Response of `POST /verify/signature`
///
/// `valid` is present for signed (chat) proofs; unsigned submission proofs
/// answer with `note` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureCheck {
    pub msg_id: String,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Handle over the read-only verification paths
#[derive(Clone)]
pub struct VerificationService {
    store: DocumentStore,
    signer: Arc<ProofSigner>,
}

impl VerificationService {
    pub fn new(store: DocumentStore, signer: Arc<ProofSigner>) -> Self {
        Self { store, signer }
    }

    /// Current Merkle root over all recorded hashes, in insertion order
    ///
    /// An empty log yields the empty-string root and a zero count.
    pub async fn root(&self) -> Result<RootInfo, ApiError> {
        let log: ProofLog = self.store.load(Document::Proofs).await?;

        Ok(RootInfo {
            merkle_root: merkle::build_root(&log.hashes()),
            total_submissions: log.len(),
        })
    }

    /// Hash the caller's plaintext and report whether it appears as a leaf
    pub async fn check_hash(&self, data: &str) -> Result<HashCheck, ApiError> {
        let log: ProofLog = self.store.load(Document::Proofs).await?;
        let hashes = log.hashes();

        let data_hash = merkle::hash_leaf(data);
        let found = hashes.iter().any(|h| *h == data_hash);

        Ok(HashCheck {
            data_hash,
            found,
            merkle_root: merkle::build_root(&hashes),
        })
    }

    /// Full inclusion proof for one recorded id
    pub async fn inclusion_proof(&self, id: &str) -> Result<InclusionProof, ApiError> {
        let log: ProofLog = self.store.load(Document::Proofs).await?;

        let index = log
            .index_of(id)
            .ok_or_else(|| ApiError::NotFound(format!("no proof found for msg_id '{}'", id)))?;
        let entry = &log.0[index];

        let (merkle_root, proof_path) = merkle::build_proof(&log.hashes(), index);

        Ok(InclusionProof {
            msg_id: id.to_string(),
            leaf_hash: entry.data_hash.clone(),
            created_at: entry.created_at,
            merkle_root,
            proof_path,
        })
    }

    /// Verify the server signature recorded for one id
    ///
    /// While the chat blob is still stored, the hash is recomputed from the
    /// ciphertext so a swapped blob cannot pass; once the sweeper has
    /// destroyed the blob, the recorded hash stands in.
    pub async fn verify_signature(&self, id: &str) -> Result<SignatureCheck, ApiError> {
        let log: ProofLog = self.store.load(Document::Proofs).await?;

        let entry = log
            .get(id)
            .ok_or_else(|| ApiError::NotFound(format!("no proof found for msg_id '{}'", id)))?;

        let Some(signature) = &entry.signature else {
            return Ok(SignatureCheck {
                msg_id: id.to_string(),
                hash: entry.data_hash.clone(),
                valid: None,
                note: Some(
                    "This submission has a hash proof but no server signature \
                     (anonymous submission — signature not applicable)."
                        .to_string(),
                ),
            });
        };

        let messages: ChatMessages = self.store.load(Document::ChatMessages).await?;
        let hash = messages
            .get(id)
            .and_then(|record| record.encrypted_message.as_ref())
            .map(|blob| hex::encode(Sha256::digest(blob.as_bytes())))
            .unwrap_or_else(|| entry.data_hash.clone());

        Ok(SignatureCheck {
            msg_id: id.to_string(),
            valid: Some(self.signer.verify(hash.as_bytes(), signature)),
            hash,
            note: None,
        })
    }
}
