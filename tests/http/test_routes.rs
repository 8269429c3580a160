//! Route-level tests: status codes and bodies as they leave the wire
//!
//! Everything here goes through `create_app()` so the router, extractors,
//! status mapping, and the admin bearer guard are all on the hook.

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::common::{app, get, post_json, request, solved_submission_body};

#[tokio::test]
async fn test_health_endpoint() {
    let test_app = app(None, 60);

    let (status, body) = get(&test_app.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_submit_read_round_trip_over_http() {
    let test_app = app(None, 60);

    let (status, body) = post_json(
        &test_app.app,
        "/auth/submit",
        solved_submission_body("hello over http"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["msg_id"], "1");

    let (status, body) = get(&test_app.app, "/auth/read/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["msg_id"], "1");
    assert_eq!(body["data"], "hello over http");
}

#[tokio::test]
async fn test_replay_answers_409_over_http() {
    let test_app = app(None, 60);
    let body = solved_submission_body("once only");

    let (status, _) = post_json(&test_app.app, "/auth/submit", body.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = post_json(&test_app.app, "/auth/submit", body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "Commitment already used");
}

#[tokio::test]
async fn test_read_unknown_msg_id_is_404() {
    let test_app = app(None, 60);

    let (status, error) = get(&test_app.app, "/auth/read/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "Not found");
}

#[tokio::test]
async fn test_verify_root_on_empty_tree() {
    let test_app = app(None, 60);

    let (status, body) = get(&test_app.app, "/verify/root").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["merkle_root"], "");
    assert_eq!(body["total_submissions"], 0);
}

#[tokio::test]
async fn test_admin_without_token_configured_is_503() {
    // no ADMIN_TOKEN: every admin route refuses with 503, token or not
    let test_app = app(None, 60);

    let (status, error) = get(&test_app.app, "/admin/stats").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(error["error"], "Admin access not configured");

    let (status, _) = request(
        &test_app.app,
        Method::POST,
        "/admin/expire",
        Some("any-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_admin_with_wrong_bearer_is_401() {
    let test_app = app(Some("correct-token"), 60);

    let (status, error) = request(
        &test_app.app,
        Method::GET,
        "/admin/stats",
        Some("wrong-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error["error"], "Unauthorized");

    // missing header entirely is also 401, not 503
    let (status, _) = get(&test_app.app, "/admin/stats").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_with_correct_bearer_succeeds() {
    let test_app = app(Some("correct-token"), 60);

    post_json(
        &test_app.app,
        "/auth/submit",
        solved_submission_body("counted"),
    )
    .await;

    let (status, stats) = request(
        &test_app.app,
        Method::GET,
        "/admin/stats",
        Some("correct-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_submissions"], 1);
    assert_eq!(stats["active_submissions"], 1);
    assert_eq!(stats["total_commitments"], 1);
}

#[tokio::test]
async fn test_admin_force_expire_sweeps_immediately() {
    // expiry of 0 minutes: the submission is dead on arrival
    let test_app = app(Some("correct-token"), 0);

    post_json(
        &test_app.app,
        "/auth/submit",
        solved_submission_body("short-lived"),
    )
    .await;

    let (status, body) = request(
        &test_app.app,
        Method::POST,
        "/admin/expire",
        Some("correct-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sweep complete");
    assert_eq!(body["destroyed"], 1);

    let (status, error) = get(&test_app.app, "/auth/read/1").await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(error["error"], "Content expired");
}

#[tokio::test]
async fn test_identity_endpoint_returns_consistent_chain() {
    let test_app = app(None, 60);

    let (status, body) = post_json(&test_app.app, "/auth/identity", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let secret = body["identity_secret"].as_str().unwrap();
    let commitment = body["commitment"].as_str().unwrap();
    assert_eq!(
        fabstir_drop_node::crypto::commitment::commitment_from_secret(secret),
        commitment
    );
}

#[tokio::test]
async fn test_server_pubkey_is_pem() {
    let test_app = app(None, 60);

    let (status, body) = get(&test_app.app, "/keys/server/pubkey").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["public_key_pem"]
        .as_str()
        .unwrap()
        .starts_with("-----BEGIN PUBLIC KEY-----"));
}
