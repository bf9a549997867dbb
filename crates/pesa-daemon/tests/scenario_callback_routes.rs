//! In-process scenario tests for pesa-daemon HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket.
//! Each test calls `routes::build_router` and drives it via
//! `tower::ServiceExt::oneshot` — no network I/O required.

use std::sync::Arc;

use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pesa_daemon::{routes, state};
use pesa_reconcile::EngineConfig;
use pesa_schemas::PaymentStatus;
use pesa_testkit::{failure_callback, success_callback, FailingOrderStore, InMemoryOrderStore};
use rust_decimal::Decimal;
use tower::ServiceExt; // oneshot

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_router(store: InMemoryOrderStore) -> axum::Router {
    let st = Arc::new(state::AppState::new(
        Arc::new(store),
        EngineConfig::default(),
    ));
    routes::build_router(st)
}

fn json_post(uri: &str, body: &serde_json::Value) -> Request<axum::body::Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

/// Drive the router with a single request and return (status, body_bytes).
async fn call(router: axum::Router, req: Request<axum::body::Body>) -> (StatusCode, bytes::Bytes) {
    let resp = router.oneshot(req).await.expect("oneshot failed");
    let status = resp.status();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    (status, body)
}

fn parse_json(b: bytes::Bytes) -> serde_json::Value {
    serde_json::from_slice(&b).expect("body is not valid JSON")
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_returns_200_ok_true() {
    let router = make_router(InMemoryOrderStore::new());
    let req = Request::builder()
        .method("GET")
        .uri("/v1/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, body) = call(router, req).await;
    assert_eq!(status, StatusCode::OK);

    let json = parse_json(body);
    assert_eq!(json["ok"], true);
    assert_eq!(json["service"], "pesa-daemon");
}

// ---------------------------------------------------------------------------
// POST /api/callback — malformed envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_envelope_is_rejected_400_without_store_access() {
    let store = InMemoryOrderStore::new();
    let seeded = store.seed_pending("5.00".parse().unwrap(), "0702322277").await;
    let router = make_router(store.clone());

    let (status, body) = call(router, json_post("/api/callback", &serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        std::str::from_utf8(&body).unwrap().contains("stkCallback"),
        "400 body should name the missing envelope"
    );

    // No store mutation happened.
    assert_eq!(
        store.get(seeded).await.unwrap().payment_status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn missing_stk_callback_level_is_rejected_400() {
    let router = make_router(InMemoryOrderStore::new());
    let raw = serde_json::json!({"Body": {}});
    let (status, _) = call(router, json_post("/api/callback", &raw)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// POST /api/callback — well-formed deliveries always ack 200
// ---------------------------------------------------------------------------

#[tokio::test]
async fn matched_callback_acks_received_and_pays_order() {
    let store = InMemoryOrderStore::new();
    let amount: Decimal = "5.00".parse().unwrap();
    let order_id = store.seed_pending(amount, "0702322277").await;
    let router = make_router(store.clone());

    let raw = success_callback(amount, "254702322277", "QBH1234567");
    let (status, body) = call(router, json_post("/api/callback", &raw)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["result"], "received");

    let order = store.get(order_id).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.mpesa_receipt.as_deref(), Some("QBH1234567"));
}

#[tokio::test]
async fn unmatched_callback_still_acks_received() {
    let router = make_router(InMemoryOrderStore::new());

    let raw = success_callback("9.99".parse().unwrap(), "254702322277", "QBH1234567");
    let (status, body) = call(router, json_post("/api/callback", &raw)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["result"], "received");
}

#[tokio::test]
async fn failure_callback_acks_received_and_mutates_nothing() {
    let store = InMemoryOrderStore::new();
    let seeded = store.seed_pending("5.00".parse().unwrap(), "0702322277").await;
    let router = make_router(store.clone());

    let raw = failure_callback(1032, "Request cancelled by user");
    let (status, body) = call(router, json_post("/api/callback", &raw)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["result"], "received");
    assert_eq!(
        store.get(seeded).await.unwrap().payment_status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn store_error_is_not_surfaced_to_the_gateway() {
    let st = Arc::new(state::AppState::new(
        Arc::new(FailingOrderStore),
        EngineConfig::default(),
    ));
    let router = routes::build_router(st);

    let raw = success_callback("5.00".parse().unwrap(), "254702322277", "QBH1234567");
    let (status, body) = call(router, json_post("/api/callback", &raw)).await;

    // Business-logic failure must not become a transport failure.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_json(body)["result"], "received");
}

// ---------------------------------------------------------------------------
// Unknown routes return 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let router = make_router(InMemoryOrderStore::new());
    let req = Request::builder()
        .method("GET")
        .uri("/v1/does_not_exist")
        .body(axum::body::Body::empty())
        .unwrap();

    let (status, _) = call(router, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
