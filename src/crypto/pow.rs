// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Proof-of-Work Verification
//!
//! Rate-limits anonymous submissions without identifying the submitter.
//! A `(commitment, nonce)` pair is valid iff the lowercase hex SHA-256 of
//! the UTF-8 concatenation `commitment + nonce` starts with `difficulty`
//! zero characters.
//!
//! Client cost is ~16^difficulty hash attempts; the server pays one hash.
//! Nonces carry no uniqueness requirement; deduplication is the
//! commitment's job.

use sha2::{Digest, Sha256};

/// Verify a proof-of-work nonce against a commitment
///
/// Difficulty 0 accepts any nonce.
pub fn verify(commitment: &str, nonce: &str, difficulty: usize) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(commitment.as_bytes());
    hasher.update(nonce.as_bytes());
    let digest = hex::encode(hasher.finalize());

    digest.bytes().take(difficulty).all(|b| b == b'0') && digest.len() >= difficulty
}

/// Brute-force the smallest decimal nonce satisfying `difficulty`
///
/// Client-side helper used by the identity diagnostics and tests; real
/// clients run this loop themselves.
pub fn solve(commitment: &str, difficulty: usize) -> String {
    let mut nonce: u64 = 0;
    loop {
        let candidate = nonce.to_string();
        if verify(commitment, &candidate, difficulty) {
            return candidate;
        }
        nonce += 1;
    }
}
