pub mod sse_helpers;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use pulse_server::{config::Config, routes, stream::bus::EventBus, AppState};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

/// Create an in-memory SQLite pool with schema applied.
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .unwrap();

    // Run schema
    let schema = include_str!("../../src/db/schema.sql");
    for statement in schema.split(';') {
        let trimmed = statement.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(&pool).await.unwrap();
        }
    }

    pool
}

/// Build the shared application state over the given pool.
pub fn test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState {
        db: pool,
        config: Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: ":memory:".into(),
        },
        bus: Arc::new(EventBus::new()),
    })
}

/// Build a test Axum app over the given state.
pub fn create_test_app(state: Arc<AppState>) -> Router {
    routes::build_router(state)
}

pub fn auth_header(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", token).parse().unwrap(),
    )
}

/// Create a user plus a live session. Returns (user_id, session_token).
pub async fn create_test_user(pool: &SqlitePool, username: &str, is_admin: bool) -> (i64, String) {
    let now = chrono::Utc::now().to_rfc3339();

    let user_id = sqlx::query("INSERT INTO users (username, is_admin, created_at) VALUES (?, ?, ?)")
        .bind(username)
        .bind(is_admin as i64)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

    let token = uuid::Uuid::new_v4().to_string();
    let expires_at = (chrono::Utc::now() + chrono::Duration::days(30)).to_rfc3339();
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at, created_at) VALUES (?, ?, ?, ?)")
        .bind(&token)
        .bind(user_id)
        .bind(&expires_at)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap();

    (user_id, token)
}

pub async fn create_channel(
    pool: &SqlitePool,
    kind: &str,
    user_a: Option<i64>,
    user_b: Option<i64>,
    ref_id: Option<i64>,
) -> i64 {
    let now = chrono::Utc::now().to_rfc3339();
    sqlx::query(
        "INSERT INTO channels (kind, user_a_id, user_b_id, ref_id, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(kind)
    .bind(user_a)
    .bind(user_b)
    .bind(ref_id)
    .bind(&now)
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

pub async fn create_dm_channel(pool: &SqlitePool, user_a: i64, user_b: i64) -> i64 {
    create_channel(pool, "dm", Some(user_a), Some(user_b), None).await
}

pub async fn create_department_channel(pool: &SqlitePool, department_id: i64) -> i64 {
    create_channel(pool, "department", None, None, Some(department_id)).await
}

pub async fn create_team_channel(pool: &SqlitePool, team_id: i64) -> i64 {
    create_channel(pool, "team", None, None, Some(team_id)).await
}

pub async fn create_project_channel(pool: &SqlitePool, project_id: i64) -> i64 {
    create_channel(pool, "project", None, None, Some(project_id)).await
}

pub async fn create_broadcast_channel(pool: &SqlitePool) -> i64 {
    create_channel(pool, "broadcast", None, None, None).await
}

pub async fn set_department(pool: &SqlitePool, user_id: i64, department_id: Option<i64>) {
    sqlx::query("UPDATE users SET department_id = ? WHERE id = ?")
        .bind(department_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn add_team_member(pool: &SqlitePool, team_id: i64, user_id: i64) {
    sqlx::query("INSERT INTO team_members (team_id, user_id) VALUES (?, ?)")
        .bind(team_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn add_project_member(pool: &SqlitePool, project_id: i64, user_id: i64) {
    sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES (?, ?)")
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Insert a message row directly, with an explicit created_at.
pub async fn insert_message(
    pool: &SqlitePool,
    channel_id: i64,
    author_id: i64,
    body: &str,
    created_at: &str,
) -> i64 {
    sqlx::query("INSERT INTO messages (channel_id, author_id, body, created_at) VALUES (?, ?, ?, ?)")
        .bind(channel_id)
        .bind(author_id)
        .bind(body)
        .bind(created_at)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}
