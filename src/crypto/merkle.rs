// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Merkle Tree for Proof-of-Existence
//!
//! The tree is recomputed on demand from the ordered list of leaf hashes
//! (hex SHA-256 digests, insertion order). Construction rule:
//!
//! - Level 0 = leaves in insertion order
//! - Pairing is left-to-right; an odd-length level duplicates its last
//!   element (paired with itself)
//! - Parent = SHA-256 of the UTF-8 concatenation of the two child *hex
//!   strings* (not raw digest bytes), hex-encoded
//! - Empty tree root is `""`; a single-leaf tree's root is the leaf itself
//!
//! An inclusion proof is a sequence of `{sibling, position}` steps walking
//! from the leaf to the root. Verifiers recompute the root from one leaf
//! without seeing any other leaf. The hex-concat and duplication rules must
//! match exactly on both sides or proofs will not verify.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which side of the concatenation the sibling occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Left,
    Right,
}

/// One step of an inclusion proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    pub sibling: String,
    pub position: Position,
}

/// SHA-256 hash of a UTF-8 string, lowercase hex
pub fn hash_leaf(data: &str) -> String {
    hex::encode(Sha256::digest(data.as_bytes()))
}

/// Combine two sibling hex hashes into their parent
fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the Merkle root of a list of leaf hashes
///
/// Returns `""` for an empty list and the leaf itself for a single leaf.
pub fn build_root(hashes: &[String]) -> String {
    if hashes.is_empty() {
        return String::new();
    }

    let mut level: Vec<String> = hashes.to_vec();
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            next.push(hash_pair(left, right));
        }
        level = next;
    }

    level.remove(0)
}

/// Build the inclusion proof for the leaf at `index`
///
/// Returns `(root, proof_path)`. When a level has odd length and the target
/// is its last element, the recorded sibling is the node itself with
/// position `right`, matching the duplication rule.
///
/// Returns `("", [])` for an empty leaf list; `index` out of range yields a
/// path for no leaf and must be guarded by the caller.
pub fn build_proof(hashes: &[String], index: usize) -> (String, Vec<ProofStep>) {
    if hashes.is_empty() {
        return (String::new(), Vec::new());
    }

    let mut proof_path = Vec::new();
    let mut level: Vec<String> = hashes.to_vec();
    let mut current_index = index;

    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for (i, pair) in level.chunks(2).enumerate() {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);

            if i * 2 == current_index {
                proof_path.push(ProofStep {
                    sibling: right.clone(),
                    position: Position::Right,
                });
            } else if i * 2 + 1 == current_index {
                proof_path.push(ProofStep {
                    sibling: left.clone(),
                    position: Position::Left,
                });
            }

            next.push(hash_pair(left, right));
        }
        level = next;
        current_index /= 2;
    }

    (level.remove(0), proof_path)
}

/// Recompute the root from a leaf and its proof path
///
/// Returns `true` iff the computed root equals `expected_root`.
pub fn verify_proof(leaf_hash: &str, proof_path: &[ProofStep], expected_root: &str) -> bool {
    let mut current = leaf_hash.to_string();
    for step in proof_path {
        current = match step.position {
            Position::Left => hash_pair(&step.sibling, &current),
            Position::Right => hash_pair(&current, &step.sibling),
        };
    }
    current == expected_root
}
