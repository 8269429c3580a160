// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! RSA-PSS Proof-of-Existence Signatures
//!
//! Signs chat leaf hashes with the persistent server signing key so any
//! third party can verify *what* content existed *when* without trusting
//! the server's own endpoints.
//!
//! Parameters: RSA-PSS over SHA-256, MGF1-SHA-256, salt length equal to
//! the digest length (32 bytes). Signatures travel as lowercase hex.
//!
//! Verification is tolerant by design: tampered or malformed inputs return
//! `false`, never an error. A `true` can only come from a valid signature.

use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::pss::{BlindedSigningKey, Signature, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use super::error::CryptoError;

/// Handle around the server signing keypair
///
/// Built once from the vault's private key and shared read-only across
/// workers. The blinded signing key protects against timing side channels
/// on the private-key operation.
pub struct ProofSigner {
    signing_key: BlindedSigningKey<Sha256>,
    verifying_key: VerifyingKey<Sha256>,
    public_key_pem: String,
}

impl ProofSigner {
    /// Wrap a loaded RSA private key for PSS signing
    pub fn new(private_key: RsaPrivateKey) -> Result<Self, CryptoError> {
        let public_key = RsaPublicKey::from(&private_key);
        let public_key_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::InvalidKey {
                key_type: "rsa_public_key".to_string(),
                reason: format!("PEM encoding failed: {}", e),
            })?;

        Ok(Self {
            signing_key: BlindedSigningKey::<Sha256>::new(private_key),
            verifying_key: VerifyingKey::<Sha256>::new(public_key),
            public_key_pem,
        })
    }

    /// Sign a byte string; returns the signature as lowercase hex
    pub fn sign(&self, data: &[u8]) -> Result<String, CryptoError> {
        let signature = self
            .signing_key
            .try_sign_with_rng(&mut rand::rngs::OsRng, data)
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        Ok(hex::encode(signature.to_bytes()))
    }

    /// Verify a hex-encoded signature over a byte string
    ///
    /// Returns `false` for malformed hex, malformed signatures, and failed
    /// verification alike.
    pub fn verify(&self, data: &[u8], signature_hex: &str) -> bool {
        let Ok(raw) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(raw.as_slice()) else {
            return false;
        };
        self.verifying_key.verify(data, &signature).is_ok()
    }

    /// The server public key as SPKI PEM, for external verifiers
    pub fn public_key_pem(&self) -> &str {
        &self.public_key_pem
    }
}
