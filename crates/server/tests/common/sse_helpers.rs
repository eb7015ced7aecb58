#![allow(dead_code)]

use pulse_server::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Start the test app on a random TCP port. Returns the base URL, the pool,
/// and the shared state (for poking at the bus directly).
pub async fn start_server() -> (String, sqlx::SqlitePool, Arc<AppState>) {
    let pool = super::setup_test_db().await;
    let state = super::test_state(pool.clone());
    let app = super::create_test_app(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let base = format!("http://127.0.0.1:{}", addr.port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    (base, pool, state)
}

/// Open the channel event stream with a session token.
pub async fn open_stream(base: &str, token: &str, channel_id: i64) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("{}/api/channels/{}/stream", base, channel_id))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
}

/// Read from the response until one complete `\n\n`-terminated frame is
/// buffered, or the timeout passes.
pub async fn next_frame(response: &mut reqwest::Response, buffer: &mut String) -> Option<String> {
    loop {
        if let Some(end) = buffer.find("\n\n") {
            let frame: String = buffer.drain(..end + 2).collect();
            return Some(frame);
        }
        let chunk = tokio::time::timeout(Duration::from_secs(3), response.chunk()).await;
        match chunk {
            Ok(Ok(Some(bytes))) => buffer.push_str(&String::from_utf8_lossy(&bytes)),
            _ => return None,
        }
    }
}

/// Like next_frame, but skips heartbeat frames.
pub async fn next_event_frame(
    response: &mut reqwest::Response,
    buffer: &mut String,
) -> Option<String> {
    loop {
        let frame = next_frame(response, buffer).await?;
        if !frame.starts_with("event: ping\n") {
            return Some(frame);
        }
    }
}
