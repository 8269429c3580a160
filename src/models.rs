// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistent Record Types
//!
//! The shapes stored in the four JSON documents. Binary fields are base64,
//! hashes and signatures lowercase hex, timestamps ISO-8601 UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::crypto::DekEnvelope;

/// Anonymous submission, keyed by stringified sequential integer `msg_id`
///
/// `wrapped_dek` becomes `null` once the expiry sweeper destroys the key;
/// the ciphertext stays forever but is permanently unreadable from then on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub ciphertext: String,
    pub nonce: String,
    pub tag: String,
    pub wrapped_dek: Option<DekEnvelope>,
    pub commitment: String,
    pub created_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl SubmissionRecord {
    /// Exactly-at-expiry counts as expired
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

/// End-to-end encrypted chat message, keyed by UUIDv4 `message_id`
///
/// The server never inspects the blobs. On expiry both are cleared and
/// `expired` flips to `true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRecord {
    pub encrypted_message: Option<String>,
    pub encrypted_key: Option<String>,
    pub receiver: String,
    pub created_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub expired: bool,
}

impl ChatRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

/// One proof-of-existence entry
///
/// `signature` is present for chat messages only; anonymous submissions
/// carry a hash proof without a server signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofEntry {
    pub id: String,
    pub data_hash: String,
    pub signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only proof log; insertion order defines the Merkle leaf order
///
/// Persisted as a JSON array because the order is semantic: the tree's
/// leaves are exactly these `data_hash` values in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProofLog(pub Vec<ProofEntry>);

impl ProofLog {
    pub fn push(&mut self, entry: ProofEntry) {
        self.0.push(entry);
    }

    pub fn get(&self, id: &str) -> Option<&ProofEntry> {
        self.0.iter().find(|e| e.id == id)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.0.iter().position(|e| e.id == id)
    }

    /// Leaf hashes in insertion order
    pub fn hashes(&self) -> Vec<String> {
        self.0.iter().map(|e| e.data_hash.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The submissions document
pub type Submissions = BTreeMap<String, SubmissionRecord>;

/// The chat-messages document
pub type ChatMessages = BTreeMap<String, ChatRecord>;

/// The commitment set: every commitment ever accepted, append-only
pub type CommitmentSet = BTreeSet<String>;

/// The public-key registry: user_id → PEM
pub type PublicKeyRegistry = BTreeMap<String, String>;

/// Next sequential submission id: max existing numeric key + 1, starting
/// at 1. Must be called inside the submissions-document mutate so the lock
/// covers allocation.
pub fn next_msg_id(submissions: &Submissions) -> String {
    let max = submissions
        .keys()
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}
