//! HTTP API tests, driving the router in-process
//!
//! Run with: cargo test --test http_api_test

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use trusted_oracle_market::{router, AppState, MarketConfig};

// ============================================================================
// HELPERS
// ============================================================================

fn app() -> Router {
    router(AppState::new(MarketConfig::new("admin")).into_shared())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(body) => Body::from(body.to_string()),
            None => Body::empty(),
        })
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Admin creates one question and registers "oracle" as a trusted source
async fn seeded_app() -> Router {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/questions",
        Some(json!({ "from": "admin", "question": "Will it rain tomorrow?" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        "POST",
        "/trusted-sources",
        Some(json!({ "from": "admin", "source": "oracle" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    app
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn test_health_and_admin() {
    let app = app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, "GET", "/admin", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"], "admin");
}

#[tokio::test]
async fn test_non_admin_rejected_with_forbidden() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/questions",
        Some(json!({ "from": "mallory", "question": "blah" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "unauthorized");

    let (_, body) = send(&app, "GET", "/questions", None).await;
    assert_eq!(body["questions"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_trusted_source_lookup() {
    let app = seeded_app().await;

    let (_, body) = send(&app, "GET", "/trusted-sources/oracle", None).await;
    assert_eq!(body["trusted"], true);

    let (_, body) = send(&app, "GET", "/trusted-sources/alice", None).await;
    assert_eq!(body["trusted"], false);
}

#[tokio::test]
async fn test_full_market_flow() {
    let app = seeded_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/questions/1/bets",
        Some(json!({ "from": "alice", "bet": true, "amount": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["side"], true);
    assert_eq!(body["amount"], 1000);

    let (status, _) = send(
        &app,
        "POST",
        "/questions/1/bets",
        Some(json!({ "from": "bob", "bet": false, "amount": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, question) = send(&app, "GET", "/questions/1", None).await;
    assert_eq!(question["positive_bet_count"], 1);
    assert_eq!(question["negative_bet_count"], 1);
    assert_eq!(question["positive_stake_total"], 1000);
    assert_eq!(question["negative_stake_total"], 500);

    let (status, _) = send(
        &app,
        "POST",
        "/questions/1/claim",
        Some(json!({ "from": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, resolved) = send(
        &app,
        "POST",
        "/questions/1/resolve",
        Some(json!({ "from": "oracle", "outcome": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["resolved"], true);
    assert_eq!(resolved["outcome"], true);

    let (_, bet) = send(&app, "GET", "/questions/1/bets/alice", None).await;
    assert_eq!(bet["pending_payout"], 1500);

    let (status, claim) = send(
        &app,
        "POST",
        "/questions/1/claim",
        Some(json!({ "from": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(claim["success"], true);
    assert_eq!(claim["payout"], 1500);

    let (status, body) = send(
        &app,
        "POST",
        "/questions/1/claim",
        Some(json!({ "from": "alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "already_claimed");

    let (status, body) = send(
        &app,
        "POST",
        "/questions/1/claim",
        Some(json!({ "from": "bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "lost_bet");

    let (_, escrow) = send(&app, "GET", "/escrow", None).await;
    assert_eq!(escrow["pool_balance"], 0);
    assert_eq!(escrow["total_deposited"], 1500);
    assert_eq!(escrow["total_paid_out"], 1500);
    assert_eq!(escrow["solvent"], true);
}

#[tokio::test]
async fn test_bet_validation_errors() {
    let app = seeded_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/questions/1/bets",
        Some(json!({ "from": "alice", "bet": true, "amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_amount");

    let (status, _) = send(
        &app,
        "POST",
        "/questions/42/bets",
        Some(json!({ "from": "alice", "bet": true, "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "GET", "/questions/1/bets/nobody", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stopped_market_rejects_bets() {
    let app = seeded_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/running",
        Some(json!({ "from": "alice", "running": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/running",
        Some(json!({ "from": "admin", "running": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["running"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/questions/1/bets",
        Some(json!({ "from": "alice", "bet": true, "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "market_stopped");
}

#[tokio::test]
async fn test_events_newest_first() {
    let app = seeded_app().await;

    let (status, body) = send(&app, "GET", "/events?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"]["type"], "TRUSTED_SOURCE_ADDED");

    let (_, body) = send(&app, "GET", "/events", None).await;
    assert_eq!(body["events"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let app = seeded_app().await;

    let (status, body) = send(&app, "GET", "/questions/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "invalid_path");

    let (status, body) = send(
        &app,
        "POST",
        "/questions/abc/bets",
        Some(json!({ "from": "alice", "bet": true, "amount": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_path");

    let (status, body) = send(
        &app,
        "POST",
        "/questions/1/bets",
        Some(json!({ "from": "alice", "bet": "maybe" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_body");
}
