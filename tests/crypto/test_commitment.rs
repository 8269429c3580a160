//! Identity commitment chain tests

use fabstir_drop_node::crypto::commitment::{
    commitment_from_secret, derive_commitment, derive_nullifier, generate_identity_secret,
};

#[test]
fn test_all_zero_secret_known_vectors() {
    let secret = "00".repeat(32);

    let nullifier = derive_nullifier(&secret);
    assert_eq!(
        nullifier,
        "66687aadf862bd776c8fc18b8e9f8e20089714856ee233b3902a591d0d5f2925"
    );

    let commitment = derive_commitment(&nullifier);
    assert_eq!(
        commitment,
        "2c26b46b68ffc68ff99b453c1d30413413422d706483bfa0f98a5e886266e7ae"
    );

    assert_eq!(commitment_from_secret(&secret), commitment);
}

#[test]
fn test_generated_secret_is_64_hex_chars() {
    let secret = generate_identity_secret();
    assert_eq!(secret.len(), 64);
    assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_distinct_secrets_give_distinct_commitments() {
    let a = commitment_from_secret(&generate_identity_secret());
    let b = commitment_from_secret(&generate_identity_secret());
    assert_ne!(a, b);
}
