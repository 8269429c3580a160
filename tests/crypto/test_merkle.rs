//! Merkle tree construction and inclusion-proof tests
//!
//! The hex-concat and last-element-duplication rules must match the
//! documented convention exactly, or externally computed proofs will not
//! verify.

use fabstir_drop_node::crypto::merkle::{
    build_proof, build_root, hash_leaf, verify_proof, Position,
};
use sha2::{Digest, Sha256};

#[test]
fn test_empty_tree_has_empty_root() {
    assert_eq!(build_root(&[]), "");

    let (root, path) = build_proof(&[], 0);
    assert_eq!(root, "");
    assert!(path.is_empty());
}

#[test]
fn test_single_leaf_root_is_the_leaf_itself() {
    // No self-pair at the top: one submission of "hello" makes the root
    // equal SHA-256("hello")
    let leaf = hash_leaf("hello");
    assert_eq!(build_root(&[leaf.clone()]), leaf);
}

#[test]
fn test_known_leaf_hash() {
    assert_eq!(
        hash_leaf("hello"),
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn test_parent_is_sha256_of_hex_concatenation() {
    let left = hash_leaf("a");
    let right = hash_leaf("b");

    // hex strings are concatenated as UTF-8, not as raw digest bytes
    let expected = hex::encode(Sha256::digest(format!("{}{}", left, right).as_bytes()));
    assert_eq!(build_root(&[left, right]), expected);
}

#[test]
fn test_roots_and_proofs_agree_across_tree_sizes() {
    for n in 1..=16 {
        let leaves: Vec<String> = (0..n).map(|i| hash_leaf(&format!("doc-{}", i))).collect();
        let root = build_root(&leaves);

        for (i, leaf) in leaves.iter().enumerate() {
            let (proof_root, path) = build_proof(&leaves, i);
            assert_eq!(proof_root, root, "proof root diverged at n={} i={}", n, i);
            assert!(
                verify_proof(leaf, &path, &root),
                "inclusion proof failed at n={} i={}",
                n,
                i
            );
        }
    }
}

#[test]
fn test_proof_path_length_is_tree_height() {
    let leaves: Vec<String> = (0..8).map(|i| hash_leaf(&i.to_string())).collect();
    let (_, path) = build_proof(&leaves, 0);
    assert_eq!(path.len(), 3);
}

#[test]
fn test_odd_tail_leaf_is_its_own_right_sibling() {
    let leaves: Vec<String> = (0..5).map(|i| hash_leaf(&i.to_string())).collect();
    let (root, path) = build_proof(&leaves, 4);

    assert_eq!(path[0].sibling, leaves[4]);
    assert_eq!(path[0].position, Position::Right);
    assert!(verify_proof(&leaves[4], &path, &root));
}

#[test]
fn test_verification_rejects_forgeries() {
    let leaves: Vec<String> = (0..6).map(|i| hash_leaf(&i.to_string())).collect();
    let root = build_root(&leaves);
    let (_, path) = build_proof(&leaves, 2);

    // wrong leaf under a valid path
    assert!(!verify_proof(&leaves[3], &path, &root));
    // valid leaf against a foreign root
    assert!(!verify_proof(&leaves[2], &path, &hash_leaf("evil")));
    // truncated path
    assert!(!verify_proof(&leaves[2], &path[..1], &root));
}
