mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use pulse_server::AppState;
use serde_json::json;
use std::sync::Arc;

async fn setup() -> (TestServer, sqlx::SqlitePool, Arc<AppState>) {
    let pool = common::setup_test_db().await;
    let state = common::test_state(pool.clone());
    let server = TestServer::new(common::create_test_app(state.clone())).unwrap();
    (server, pool, state)
}

#[tokio::test]
async fn create_message_requires_authentication() {
    let (server, pool, _state) = setup().await;
    let (alice, _) = common::create_test_user(&pool, "alice", false).await;
    let (bob, _) = common::create_test_user(&pool, "bob", false).await;
    let channel = common::create_dm_channel(&pool, alice, bob).await;

    let res = server
        .post(&format!("/api/channels/{}/messages", channel))
        .json(&json!({"body": "hi"}))
        .await;
    res.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_message_requires_channel_membership() {
    let (server, pool, _state) = setup().await;
    let (alice, _) = common::create_test_user(&pool, "alice", false).await;
    let (bob, _) = common::create_test_user(&pool, "bob", false).await;
    let (_carol, carol_token) = common::create_test_user(&pool, "carol", false).await;
    let channel = common::create_dm_channel(&pool, alice, bob).await;

    let (name, value) = common::auth_header(&carol_token);
    let res = server
        .post(&format!("/api/channels/{}/messages", channel))
        .add_header(name, value)
        .json(&json!({"body": "hi"}))
        .await;
    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_message_rejects_empty_body() {
    let (server, pool, _state) = setup().await;
    let (alice, token) = common::create_test_user(&pool, "alice", false).await;
    let (bob, _) = common::create_test_user(&pool, "bob", false).await;
    let channel = common::create_dm_channel(&pool, alice, bob).await;

    let (name, value) = common::auth_header(&token);
    let res = server
        .post(&format!("/api/channels/{}/messages", channel))
        .add_header(name, value)
        .json(&json!({"body": "   "}))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_message_rejects_malformed_channel_id() {
    let (server, pool, _state) = setup().await;
    let (_alice, token) = common::create_test_user(&pool, "alice", false).await;

    let (name, value) = common::auth_header(&token);
    let res = server
        .post("/api/channels/not-a-number/messages")
        .add_header(name, value)
        .json(&json!({"body": "hi"}))
        .await;
    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_message_persists_and_publishes() {
    let (server, pool, state) = setup().await;
    let (alice, token) = common::create_test_user(&pool, "alice", false).await;
    let (bob, _) = common::create_test_user(&pool, "bob", false).await;
    let channel = common::create_dm_channel(&pool, alice, bob).await;

    let mut sub = state.bus.subscribe(channel).await;

    let (name, value) = common::auth_header(&token);
    let res = server
        .post(&format!("/api/channels/{}/messages", channel))
        .add_header(name, value)
        .json(&json!({"body": "hello bob"}))
        .await;
    res.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = res.json();
    assert_eq!(body["body"], "hello bob");
    assert_eq!(body["channelId"], channel);
    assert_eq!(body["authorId"], alice);

    let stored = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE channel_id = ?")
        .bind(channel)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored, 1);

    let frame = sub.recv().await.unwrap();
    assert!(frame.starts_with("event: message\n"));
    assert!(frame.contains("\"body\":\"hello bob\""));
}

#[tokio::test]
async fn list_messages_requires_channel_membership() {
    let (server, pool, _state) = setup().await;
    let (alice, _) = common::create_test_user(&pool, "alice", false).await;
    let (bob, _) = common::create_test_user(&pool, "bob", false).await;
    let (_carol, carol_token) = common::create_test_user(&pool, "carol", false).await;
    let channel = common::create_dm_channel(&pool, alice, bob).await;

    let (name, value) = common::auth_header(&carol_token);
    let res = server
        .get(&format!("/api/channels/{}/messages", channel))
        .add_header(name, value)
        .await;
    res.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn list_messages_returns_chronological_and_skips_deleted() {
    let (server, pool, _state) = setup().await;
    let (alice, token) = common::create_test_user(&pool, "alice", false).await;
    let (bob, _) = common::create_test_user(&pool, "bob", false).await;
    let channel = common::create_dm_channel(&pool, alice, bob).await;

    let base = chrono::Utc::now();
    for (i, body) in ["one", "two", "three"].iter().enumerate() {
        let at = (base + chrono::Duration::seconds(i as i64)).to_rfc3339();
        common::insert_message(&pool, channel, alice, body, &at).await;
    }
    let deleted_at = (base + chrono::Duration::seconds(10)).to_rfc3339();
    let gone = common::insert_message(&pool, channel, alice, "gone", &deleted_at).await;
    sqlx::query("UPDATE messages SET deleted_at = ? WHERE id = ?")
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(gone)
        .execute(&pool)
        .await
        .unwrap();

    let (name, value) = common::auth_header(&token);
    let res = server
        .get(&format!("/api/channels/{}/messages", channel))
        .add_header(name, value)
        .await;
    res.assert_status(StatusCode::OK);

    let body: serde_json::Value = res.json();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["body"], "one");
    assert_eq!(items[2]["body"], "three");
    assert_eq!(body["hasMore"], false);
}
