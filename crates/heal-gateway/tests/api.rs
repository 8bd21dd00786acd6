//! Router-level tests against a real store and the mock token validator.

use std::sync::Arc;

use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};
use tempfile::TempDir;

use heal_auth::MockJwtValidator;
use heal_chat::{CannedResponder, CompanionService, Responder, UnconfiguredResponder};
use heal_core::UserId;
use heal_gateway::{create_router, GatewayConfig, GatewayState};
use heal_store::RocksStore;

struct Harness {
    server: TestServer,
    _dir: TempDir,
}

fn harness<R: Responder + 'static>(responder: R) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    let companion = Arc::new(CompanionService::with_defaults(store, Arc::new(responder)));
    let state = GatewayState::new(
        companion,
        Arc::new(MockJwtValidator),
        GatewayConfig::default(),
    );

    Harness {
        server: TestServer::new(create_router(state)).unwrap(),
        _dir: dir,
    }
}

fn as_user(request: TestRequest, user_id: &UserId) -> TestRequest {
    request.add_header(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer test-token:{user_id}")).unwrap(),
    )
}

async fn send(h: &Harness, user_id: &UserId, body: Value) -> Value {
    let response = as_user(h.server.post("/v1/chat/messages"), user_id)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()
}

#[tokio::test]
async fn health_is_public() {
    let h = harness(CannedResponder);

    let response = h.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let h = harness(CannedResponder);

    let response = h.server.get("/v1/chat/sessions").expect_failure().await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "unauthorized");
}

#[tokio::test]
async fn conversation_round_trip() {
    let h = harness(CannedResponder);
    let user = UserId::generate();

    let turn = send(&h, &user, json!({ "content": "I feel so anxious" })).await;
    let session_id = turn["session"]["id"].as_str().unwrap().to_string();

    assert_eq!(turn["userMessage"]["senderType"], "user");
    assert_eq!(turn["userMessage"]["messageType"], "text");
    assert_eq!(turn["aiResponse"]["senderType"], "assistant");
    assert_eq!(turn["session"]["updatedAt"], turn["aiResponse"]["createdAt"]);

    send(
        &h,
        &user,
        json!({ "sessionId": session_id, "content": "thank you" }),
    )
    .await;

    let history = as_user(
        h.server
            .get(&format!("/v1/chat/sessions/{session_id}/messages")),
        &user,
    )
    .await
    .json::<Value>();
    let contents: Vec<_> = history["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(contents.len(), 4);
    assert_eq!(contents[0], "I feel so anxious");
    assert_eq!(contents[2], "thank you");

    let sessions = as_user(h.server.get("/v1/chat/sessions"), &user)
        .await
        .json::<Value>();
    assert_eq!(sessions["sessions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_session_looks_missing() {
    let h = harness(CannedResponder);
    let owner = UserId::generate();
    let intruder = UserId::generate();
    let turn = send(&h, &owner, json!({ "content": "hello" })).await;
    let session_id = turn["session"]["id"].as_str().unwrap();

    let foreign = as_user(
        h.server
            .get(&format!("/v1/chat/sessions/{session_id}/messages")),
        &intruder,
    )
    .expect_failure()
    .await;
    let unknown = as_user(
        h.server.get(&format!(
            "/v1/chat/sessions/{}/messages",
            heal_core::SessionId::generate()
        )),
        &intruder,
    )
    .expect_failure()
    .await;

    assert_eq!(foreign.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(foreign.json::<Value>(), unknown.json::<Value>());
}

#[tokio::test]
async fn delete_session_removes_history() {
    let h = harness(CannedResponder);
    let user = UserId::generate();
    let turn = send(&h, &user, json!({ "content": "hello" })).await;
    let session_id = turn["session"]["id"].as_str().unwrap();

    let deleted = as_user(
        h.server.delete(&format!("/v1/chat/sessions/{session_id}")),
        &user,
    )
    .await;
    assert_eq!(deleted.status_code(), StatusCode::OK);

    let history = as_user(
        h.server
            .get(&format!("/v1/chat/sessions/{session_id}/messages")),
        &user,
    )
    .expect_failure()
    .await;
    assert_eq!(history.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feedback_validates_rating() {
    let h = harness(CannedResponder);
    let user = UserId::generate();
    let turn = send(&h, &user, json!({ "content": "hello" })).await;
    let body = |rating: u8| {
        json!({
            "sessionId": turn["session"]["id"],
            "messageId": turn["aiResponse"]["id"],
            "rating": rating,
            "feedback": "kind words"
        })
    };

    let rejected = as_user(h.server.post("/v1/chat/feedback"), &user)
        .json(&body(9))
        .expect_failure()
        .await;
    assert_eq!(rejected.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(rejected.json::<Value>()["error"]["code"], "validation_error");

    let accepted = as_user(h.server.post("/v1/chat/feedback"), &user)
        .json(&body(5))
        .await;
    assert_eq!(accepted.status_code(), StatusCode::OK);
    assert_eq!(accepted.json::<Value>()["feedback"]["rating"], 5);
}

#[tokio::test]
async fn responder_outage_keeps_user_message() {
    let h = harness(UnconfiguredResponder);
    let user = UserId::generate();
    let session_id = heal_core::SessionId::generate();

    let response = as_user(h.server.post("/v1/chat/messages"), &user)
        .json(&json!({ "sessionId": session_id.to_string(), "content": "hello?" }))
        .expect_failure()
        .await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "responder_unavailable"
    );

    let history = as_user(
        h.server
            .get(&format!("/v1/chat/sessions/{session_id}/messages")),
        &user,
    )
    .await
    .json::<Value>();
    assert_eq!(history["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_body_uses_error_shape() {
    let h = harness(CannedResponder);
    let user = UserId::generate();

    let response = as_user(h.server.post("/v1/chat/messages"), &user)
        .json(&json!({ "text": "wrong field" }))
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "validation_error");
}

#[tokio::test]
async fn alert_lifecycle() {
    let h = harness(CannedResponder);
    let user = UserId::generate();

    let created = as_user(h.server.post("/v1/crisis/alerts"), &user)
        .json(&json!({
            "severity": "high",
            "message": "not safe at home",
            "location": { "lat": -1.29, "lng": 36.82 }
        }))
        .await;
    assert_eq!(created.status_code(), StatusCode::CREATED);
    let alert = created.json::<Value>();
    assert_eq!(alert["status"], "active");
    let alert_id = alert["id"].as_str().unwrap();

    let resolved = as_user(
        h.server.post(&format!("/v1/crisis/alerts/{alert_id}/status")),
        &user,
    )
    .json(&json!({ "status": "resolved" }))
    .await;
    assert_eq!(resolved.status_code(), StatusCode::OK);
    assert!(resolved.json::<Value>()["resolvedAt"].is_string());

    let again = as_user(
        h.server.post(&format!("/v1/crisis/alerts/{alert_id}/status")),
        &user,
    )
    .json(&json!({ "status": "escalated" }))
    .expect_failure()
    .await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);

    let listed = as_user(h.server.get("/v1/crisis/alerts"), &user)
        .await
        .json::<Value>();
    assert_eq!(listed["alerts"][0]["status"], "resolved");
}

#[tokio::test]
async fn unknown_severity_is_rejected() {
    let h = harness(CannedResponder);

    let response = as_user(h.server.post("/v1/crisis/alerts"), &UserId::generate())
        .json(&json!({ "severity": "apocalyptic" }))
        .expect_failure()
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn single_primary_contact() {
    let h = harness(CannedResponder);
    let user = UserId::generate();

    for (name, primary) in [("Amina", true), ("Otieno", false), ("Wanjiru", true)] {
        let response = as_user(h.server.post("/v1/crisis/contacts"), &user)
            .json(&json!({ "name": name, "phone": "+254700000000", "isPrimary": primary }))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let listed = as_user(h.server.get("/v1/crisis/contacts"), &user)
        .await
        .json::<Value>();
    let contacts = listed["contacts"].as_array().unwrap();
    let primaries: Vec<_> = contacts
        .iter()
        .filter(|c| c["isPrimary"] == true)
        .collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(contacts[0]["name"], "Wanjiru");
}

#[tokio::test]
async fn safety_plan_upsert() {
    let h = harness(CannedResponder);
    let user = UserId::generate();

    let missing = as_user(h.server.get("/v1/crisis/safety-plan"), &user)
        .expect_failure()
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let first = as_user(h.server.put("/v1/crisis/safety-plan"), &user)
        .json(&json!({ "warningSigns": ["isolating"], "copingStrategies": ["walk"] }))
        .await
        .json::<Value>();
    let second = as_user(h.server.put("/v1/crisis/safety-plan"), &user)
        .json(&json!({ "warningSigns": ["not sleeping"] }))
        .await
        .json::<Value>();

    assert_eq!(first["id"], second["id"]);
    assert_eq!(second["warningSigns"], json!(["not sleeping"]));
    assert_eq!(second["copingStrategies"], json!(["walk"]));

    let fetched = as_user(h.server.get("/v1/crisis/safety-plan"), &user)
        .await
        .json::<Value>();
    assert_eq!(fetched, second);
}
