// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-EAX Authenticated Encryption
//!
//! Implements the two layers of the key hierarchy:
//!
//! - **Data encryption**: each submission is sealed with a fresh 256-bit
//!   Data Encryption Key (DEK)
//! - **Key wrapping**: the DEK itself is sealed under the long-lived Key
//!   Encryption Key (KEK) from the vault
//!
//! **Envelope format** (JSON storage, all fields base64):
//! ```text
//! { ciphertext | wrapped, nonce (16 bytes), tag (16 bytes) }
//! ```
//!
//! AES-256-EAX with a random 16-byte nonce per operation and a detached
//! 16-byte authentication tag. A tag mismatch surfaces as
//! [`CryptoError::AuthenticationFailed`] and must be treated as corruption,
//! not retried.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use eax::{
    aead::{generic_array::GenericArray, AeadInPlace, KeyInit},
    Eax,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};

use super::error::CryptoError;

type Aes256Eax = Eax<Aes256>;

/// AES-EAX nonce length in bytes
pub const NONCE_SIZE: usize = 16;
/// AES-EAX authentication tag length in bytes
pub const TAG_SIZE: usize = 16;
/// DEK / KEK length in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// An AES-EAX sealed plaintext as persisted in a submission record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ciphertext: String,
    pub nonce: String,
    pub tag: String,
}

/// A KEK-wrapped DEK as persisted in a submission record
///
/// Set to `null` in storage once the expiry sweeper destroys the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DekEnvelope {
    pub wrapped: String,
    pub nonce: String,
    pub tag: String,
}

/// Generate a fresh 256-bit Data Encryption Key
pub fn generate_dek() -> [u8; KEY_SIZE] {
    let mut dek = [0u8; KEY_SIZE];
    OsRng.fill_bytes(&mut dek);
    dek
}

/// Encrypt plaintext bytes under a 32-byte key
///
/// A cryptographically random 16-byte nonce is generated per call. The
/// returned payload carries ciphertext, nonce, and detached tag, each
/// base64-encoded for JSON storage.
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<EncryptedPayload, CryptoError> {
    let cipher = new_cipher(key)?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&nonce), b"", &mut buffer)
        .map_err(|_| CryptoError::Other("AES-EAX encryption failed".to_string()))?;

    Ok(EncryptedPayload {
        ciphertext: BASE64.encode(&buffer),
        nonce: BASE64.encode(nonce),
        tag: BASE64.encode(tag),
    })
}

/// Decrypt an [`EncryptedPayload`] under a 32-byte key
///
/// # Errors
///
/// - [`CryptoError::AuthenticationFailed`] if the tag does not verify
///   (wrong key or tampered ciphertext)
/// - [`CryptoError::InvalidNonce`] / [`CryptoError::InvalidEnvelope`] on
///   malformed stored fields
pub fn decrypt(key: &[u8], payload: &EncryptedPayload) -> Result<Vec<u8>, CryptoError> {
    let cipher = new_cipher(key)?;

    let nonce = decode_field("nonce", &payload.nonce)?;
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidNonce {
            expected_size: NONCE_SIZE,
            actual_size: nonce.len(),
        });
    }

    let tag = decode_field("tag", &payload.tag)?;
    if tag.len() != TAG_SIZE {
        return Err(CryptoError::InvalidEnvelope {
            field: "tag".to_string(),
            reason: format!("expected {} bytes, got {}", TAG_SIZE, tag.len()),
        });
    }

    let mut buffer = decode_field("ciphertext", &payload.ciphertext)?;
    cipher
        .decrypt_in_place_detached(
            GenericArray::from_slice(&nonce),
            b"",
            &mut buffer,
            GenericArray::from_slice(&tag),
        )
        .map_err(|_| CryptoError::AuthenticationFailed {
            operation: "decrypt".to_string(),
        })?;

    Ok(buffer)
}

/// Wrap (encrypt) a DEK under the KEK
pub fn wrap_dek(kek: &[u8], dek: &[u8; KEY_SIZE]) -> Result<DekEnvelope, CryptoError> {
    let sealed = encrypt(kek, dek)?;
    Ok(DekEnvelope {
        wrapped: sealed.ciphertext,
        nonce: sealed.nonce,
        tag: sealed.tag,
    })
}

/// Unwrap (decrypt) a DEK using the KEK
///
/// # Errors
///
/// [`CryptoError::AuthenticationFailed`] on tag mismatch; the caller must
/// surface this as an integrity failure, the envelope is corrupt.
pub fn unwrap_dek(kek: &[u8], envelope: &DekEnvelope) -> Result<[u8; KEY_SIZE], CryptoError> {
    let payload = EncryptedPayload {
        ciphertext: envelope.wrapped.clone(),
        nonce: envelope.nonce.clone(),
        tag: envelope.tag.clone(),
    };

    let plain = decrypt(kek, &payload).map_err(|e| match e {
        CryptoError::AuthenticationFailed { .. } => CryptoError::AuthenticationFailed {
            operation: "unwrap_dek".to_string(),
        },
        other => other,
    })?;

    let dek: [u8; KEY_SIZE] = plain.try_into().map_err(|v: Vec<u8>| CryptoError::InvalidKey {
        key_type: "dek".to_string(),
        reason: format!("expected {} bytes, got {}", KEY_SIZE, v.len()),
    })?;

    Ok(dek)
}

fn new_cipher(key: &[u8]) -> Result<Aes256Eax, CryptoError> {
    if key.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKey {
            key_type: "aes_key".to_string(),
            reason: format!("expected {} bytes (256 bits), got {}", KEY_SIZE, key.len()),
        });
    }
    Ok(Aes256Eax::new(GenericArray::from_slice(key)))
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    BASE64
        .decode(value)
        .map_err(|e| CryptoError::InvalidEnvelope {
            field: field.to_string(),
            reason: format!("base64 decode error: {}", e),
        })
}
