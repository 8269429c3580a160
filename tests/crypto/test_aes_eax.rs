//! AES-EAX round-trip and integrity tests
//!
//! `decrypt(k, encrypt(k, p)) = p` and `unwrap_dek(wrap_dek(k)) = k` must
//! hold for arbitrary keys and plaintexts; any tampering must surface as an
//! authentication failure, never as wrong plaintext.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use fabstir_drop_node::crypto::aes_eax::{
    decrypt, encrypt, generate_dek, unwrap_dek, wrap_dek, KEY_SIZE, NONCE_SIZE, TAG_SIZE,
};
use fabstir_drop_node::crypto::CryptoError;

#[test]
fn test_encrypt_decrypt_roundtrip() {
    let key = generate_dek();
    let plaintexts: &[&[u8]] = &[b"", b"x", b"hello", &[0u8; 1024]];

    for plaintext in plaintexts {
        let payload = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &payload).unwrap();
        assert_eq!(&decrypted, plaintext, "roundtrip must be lossless");
    }
}

#[test]
fn test_wrap_unwrap_roundtrip_for_random_deks() {
    let kek = generate_dek();

    for _ in 0..8 {
        let dek = generate_dek();
        let envelope = wrap_dek(&kek, &dek).unwrap();
        assert_eq!(unwrap_dek(&kek, &envelope).unwrap(), dek);
    }
}

#[test]
fn test_envelope_fields_are_base64_with_expected_sizes() {
    let key = generate_dek();
    let payload = encrypt(&key, b"sized").unwrap();

    assert_eq!(BASE64.decode(&payload.nonce).unwrap().len(), NONCE_SIZE);
    assert_eq!(BASE64.decode(&payload.tag).unwrap().len(), TAG_SIZE);
    assert_eq!(BASE64.decode(&payload.ciphertext).unwrap().len(), 5);
}

#[test]
fn test_tampering_any_field_fails_authentication() {
    let key = generate_dek();
    let payload = encrypt(&key, b"integrity matters").unwrap();

    let tamper = |value: &str| {
        let mut raw = BASE64.decode(value).unwrap();
        raw[0] ^= 0xFF;
        BASE64.encode(raw)
    };

    let mut bad = payload.clone();
    bad.ciphertext = tamper(&payload.ciphertext);
    assert!(matches!(
        decrypt(&key, &bad),
        Err(CryptoError::AuthenticationFailed { .. })
    ));

    let mut bad = payload.clone();
    bad.tag = tamper(&payload.tag);
    assert!(matches!(
        decrypt(&key, &bad),
        Err(CryptoError::AuthenticationFailed { .. })
    ));

    let mut bad = payload.clone();
    bad.nonce = tamper(&payload.nonce);
    assert!(matches!(
        decrypt(&key, &bad),
        Err(CryptoError::AuthenticationFailed { .. })
    ));
}

#[test]
fn test_unwrap_under_wrong_kek_is_authentication_failure() {
    let kek = generate_dek();
    let dek = generate_dek();
    let envelope = wrap_dek(&kek, &dek).unwrap();

    let result = unwrap_dek(&generate_dek(), &envelope);
    assert!(matches!(
        result,
        Err(CryptoError::AuthenticationFailed { .. })
    ));
}

#[test]
fn test_generated_deks_are_full_length_and_distinct() {
    let a = generate_dek();
    let b = generate_dek();
    assert_eq!(a.len(), KEY_SIZE);
    assert_ne!(a, b);
}
