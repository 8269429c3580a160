// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error types for the key-hierarchy and proof primitives with context
//! preservation.
//!
//! ## Error Variants
//!
//! - **AuthenticationFailed**: AEAD tag verification failed (wrong key,
//!   tampered ciphertext). Callers must treat this as a hard integrity
//!   failure, never a retry.
//! - **InvalidKey**: key material has the wrong size or cannot be parsed
//! - **InvalidNonce**: nonce size validation failed (AES-EAX uses 16 bytes)
//! - **InvalidEnvelope**: a stored envelope field failed base64/hex decoding
//! - **SigningFailed**: RSA-PSS signing could not be performed
//! - **Other**: library errors or unexpected failures

/// Error type for all cryptographic operations in the node core
#[derive(Debug, Clone, thiserror::Error)]
pub enum CryptoError {
    /// AEAD authentication failed during decrypt or unwrap
    #[error("Authentication failed during {operation}")]
    AuthenticationFailed {
        /// Which operation was being performed (e.g. "unwrap_dek")
        operation: String,
    },

    /// Invalid cryptographic key
    #[error("Invalid key ({key_type}): {reason}")]
    InvalidKey {
        /// Type of key that failed (e.g. "kek", "dek", "rsa_public_key")
        key_type: String,
        /// Specific failure reason
        reason: String,
    },

    /// Invalid nonce size
    #[error("Invalid nonce size: expected {expected_size} bytes, got {actual_size} bytes")]
    InvalidNonce {
        /// Expected nonce size (16 for AES-EAX)
        expected_size: usize,
        /// Actual nonce size provided
        actual_size: usize,
    },

    /// A persisted envelope field failed decoding
    #[error("Invalid envelope field '{field}': {reason}")]
    InvalidEnvelope {
        /// Which field failed (e.g. "ciphertext", "tag")
        field: String,
        /// Specific failure reason
        reason: String,
    },

    /// RSA-PSS signing failed
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Generic error for library errors or unexpected failures
    #[error("Crypto error: {0}")]
    Other(String),
}

impl From<base64::DecodeError> for CryptoError {
    fn from(err: base64::DecodeError) -> Self {
        CryptoError::InvalidEnvelope {
            field: "base64_field".to_string(),
            reason: format!("base64 decode error: {}", err),
        }
    }
}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidEnvelope {
            field: "hex_field".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}
