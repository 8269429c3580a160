//! Chat pipeline scenarios: registry gating, proof signing, inbox filtering

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

use super::common::{node, rsa_public_key_pem};
use fabstir_drop_node::api::ApiError;
use fabstir_drop_node::chat::ChatSendRequest;
use fabstir_drop_node::registry::RegisterKeyRequest;

async fn register(node: &super::common::TestNode, user_id: &str) -> Result<(), ApiError> {
    node.registry
        .register(&RegisterKeyRequest {
            user_id: user_id.to_string(),
            public_key: rsa_public_key_pem(),
        })
        .await
}

fn blob_request(receiver: &str) -> ChatSendRequest {
    ChatSendRequest {
        encrypted_message: BASE64.encode("A"),
        encrypted_key: BASE64.encode("B"),
        receiver: receiver.to_string(),
    }
}

#[tokio::test]
async fn test_chat_round_trip_with_signed_proof() {
    let node = node(60);
    register(&node, "alice").await.unwrap();

    let receipt = node.chat.send(&blob_request("alice")).await.unwrap();
    assert!(!receipt.message_id.is_empty());

    // server attests to exactly the ciphertext blob it stored
    let check = node
        .verification
        .verify_signature(&receipt.message_id)
        .await
        .unwrap();

    let expected_hash = hex::encode(Sha256::digest(BASE64.encode("A").as_bytes()));
    assert_eq!(check.valid, Some(true));
    assert_eq!(check.hash, expected_hash);
    assert!(check.note.is_none());
}

#[tokio::test]
async fn test_unknown_receiver_is_rejected() {
    let node = node(60);

    let result = node.chat.send(&blob_request("nobody")).await;
    assert!(matches!(result, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_missing_fields_are_bad_requests() {
    let node = node(60);
    register(&node, "alice").await.unwrap();

    let mut request = blob_request("alice");
    request.encrypted_message = String::new();
    assert!(matches!(
        node.chat.send(&request).await,
        Err(ApiError::InvalidRequest(_))
    ));

    let mut request = blob_request("alice");
    request.encrypted_key = String::new();
    assert!(matches!(
        node.chat.send(&request).await,
        Err(ApiError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_inbox_returns_only_the_receivers_messages() {
    let node = node(60);
    register(&node, "alice").await.unwrap();
    register(&node, "bob").await.unwrap();

    let for_alice = node.chat.send(&blob_request("alice")).await.unwrap();
    node.chat.send(&blob_request("bob")).await.unwrap();

    let inbox = node.chat.inbox("alice").await.unwrap();
    assert_eq!(inbox.len(), 1);

    let record = &inbox[&for_alice.message_id];
    assert_eq!(record.receiver, "alice");
    assert!(!record.expired);
    assert_eq!(record.encrypted_message.as_deref(), Some(BASE64.encode("A").as_str()));

    assert!(node.chat.inbox("carol").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_registry_rejects_malformed_pem() {
    let node = node(60);

    let result = node
        .registry
        .register(&RegisterKeyRequest {
            user_id: "mallory".to_string(),
            public_key: "definitely not a PEM".to_string(),
        })
        .await;
    assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_registry_upsert_replaces_key_and_lookup_returns_it() {
    let node = node(60);

    let first = rsa_public_key_pem();
    let second = rsa_public_key_pem();

    for pem in [&first, &second] {
        node.registry
            .register(&RegisterKeyRequest {
                user_id: "alice".to_string(),
                public_key: pem.clone(),
            })
            .await
            .unwrap();
    }

    let key = node.registry.lookup("alice").await.unwrap();
    assert_eq!(key.public_key, second.trim());

    assert!(matches!(
        node.registry.lookup("bob").await,
        Err(ApiError::NotFound(_))
    ));
}
