// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Identity Commitment Chain
//!
//! Semaphore-style hash-chain commitments:
//!
//! ```text
//! identity_secret  (private, held by the client)
//!     ↓ SHA-256
//! nullifier        (private)
//!     ↓ SHA-256
//! commitment       (public, the only value the server ever sees)
//! ```
//!
//! The server cannot invert the chain; the zero-knowledge property is the
//! one-wayness of SHA-256. Each secret yields exactly one commitment, so
//! the commitment set enforces one submission per identity without
//! learning who submitted.
//!
//! Derivation lives server-side only for the `/auth/identity` diagnostic
//! endpoint and for tests; real clients derive locally and never transmit
//! the secret.

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Generate a fresh 256-bit identity secret, hex-encoded
pub fn generate_identity_secret() -> String {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    hex::encode(secret)
}

/// Derive the nullifier from an identity secret
pub fn derive_nullifier(identity_secret: &str) -> String {
    hex::encode(Sha256::digest(identity_secret.as_bytes()))
}

/// Derive the public commitment from a nullifier
pub fn derive_commitment(nullifier: &str) -> String {
    hex::encode(Sha256::digest(nullifier.as_bytes()))
}

/// Derive a commitment directly from an identity secret
pub fn commitment_from_secret(identity_secret: &str) -> String {
    derive_commitment(&derive_nullifier(identity_secret))
}
