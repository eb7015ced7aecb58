use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use pulse_shared::constants::{MESSAGE_EDIT_WINDOW_SECS, MESSAGE_PAGE_SIZE};
use pulse_shared::validation::validate_message_body;

use crate::authz;
use crate::models::{AuthUser, Message, PaginatedResponse};
use crate::settings;
use crate::stream::events::ChatEvent;
use crate::AppState;

#[derive(Deserialize)]
pub struct MessageQuery {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct MessageBody {
    pub body: String,
}

/// True while `created_at` is within the author self-service window.
fn within_edit_window(created_at: &str) -> bool {
    match chrono::DateTime::parse_from_rfc3339(created_at) {
        Ok(t) => {
            let age = chrono::Utc::now().signed_duration_since(t.with_timezone(&chrono::Utc));
            age <= chrono::Duration::seconds(MESSAGE_EDIT_WINDOW_SECS)
        }
        Err(_) => false,
    }
}

async fn fetch_message(db: &sqlx::SqlitePool, message_id: i64) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(message_id)
        .fetch_optional(db)
        .await
}

/// GET /api/channels/:channelId/messages
///
/// Clients reconcile through this listing when a stream reconnects, so it
/// excludes soft-deleted rows and pages newest-first by created_at.
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(channel_id): Path<i64>,
    Query(query): Query<MessageQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(MESSAGE_PAGE_SIZE).min(100);

    match authz::can_read(&state.db, &user, channel_id).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "Not a member of this channel"})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Channel lookup failed: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Lookup failed"})),
            )
                .into_response();
        }
    }

    let items = if let Some(cursor) = &query.cursor {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE channel_id = ? AND deleted_at IS NULL AND created_at < ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(channel_id)
        .bind(cursor)
        .bind(limit + 1)
        .fetch_all(&state.db)
        .await
        .unwrap_or_default()
    } else {
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE channel_id = ? AND deleted_at IS NULL ORDER BY created_at DESC LIMIT ?",
        )
        .bind(channel_id)
        .bind(limit + 1)
        .fetch_all(&state.db)
        .await
        .unwrap_or_default()
    };

    let has_more = items.len() as i64 > limit;
    let mut items = items;
    if has_more {
        items.pop();
    }
    items.reverse(); // chronological order

    let cursor = items.first().map(|m| m.created_at.clone());

    Json(PaginatedResponse {
        items,
        cursor,
        has_more,
    })
    .into_response()
}

/// POST /api/channels/:channelId/messages
pub async fn create_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(channel_id): Path<i64>,
    Json(payload): Json<MessageBody>,
) -> impl IntoResponse {
    if let Err(e) = validate_message_body(&payload.body) {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": e}))).into_response();
    }

    match authz::can_write(&state.db, &user, channel_id).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "Not a member of this channel"})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Channel lookup failed: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Lookup failed"})),
            )
                .into_response();
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query(
        "INSERT INTO messages (channel_id, author_id, body, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(channel_id)
    .bind(user.id)
    .bind(&payload.body)
    .bind(&now)
    .execute(&state.db)
    .await;

    let id = match result {
        Ok(r) => r.last_insert_rowid(),
        Err(e) => {
            tracing::error!("Failed to insert message: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to save message"})),
            )
                .into_response();
        }
    };

    let message = Message {
        id,
        channel_id,
        author_id: user.id,
        body: payload.body,
        created_at: now,
        updated_at: None,
        deleted_at: None,
    };

    // Published only after the row is committed; fan-out problems stay
    // internal to the bus.
    state
        .bus
        .publish(channel_id, &ChatEvent::Message(message.clone()))
        .await;

    (StatusCode::CREATED, Json(message)).into_response()
}

/// PUT /api/messages/:messageId
pub async fn edit_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<i64>,
    Json(payload): Json<MessageBody>,
) -> impl IntoResponse {
    if let Err(e) = validate_message_body(&payload.body) {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": e}))).into_response();
    }

    let row = match fetch_message(&state.db, message_id).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to load message: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Lookup failed"})),
            )
                .into_response();
        }
    };

    let message = match row {
        Some(m) if !m.is_deleted() => m,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Message not found"})),
            )
                .into_response()
        }
    };

    if !user.is_admin {
        if message.author_id != user.id {
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "Not your message"})),
            )
                .into_response();
        }
        if !within_edit_window(&message.created_at) {
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "Edit window has passed"})),
            )
                .into_response();
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query("UPDATE messages SET body = ?, updated_at = ? WHERE id = ?")
        .bind(&payload.body)
        .bind(&now)
        .bind(message_id)
        .execute(&state.db)
        .await;

    if let Err(e) = result {
        tracing::error!("Failed to update message: {:?}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to update message"})),
        )
            .into_response();
    }

    state
        .bus
        .publish(
            message.channel_id,
            &ChatEvent::MessageUpdated {
                message_id,
                body: payload.body.clone(),
                updated_at: now.clone(),
            },
        )
        .await;

    Json(serde_json::json!({
        "messageId": message_id,
        "body": payload.body,
        "updatedAt": now,
    }))
    .into_response()
}

/// DELETE /api/messages/:messageId
///
/// Soft delete. The author may delete within the edit window, or at any time
/// while the allow_message_deletion setting is on; administrators may delete
/// any message. The setting is read fresh on every call.
pub async fn delete_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<i64>,
) -> impl IntoResponse {
    let row = match fetch_message(&state.db, message_id).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to load message: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Lookup failed"})),
            )
                .into_response();
        }
    };

    let message = match row {
        Some(m) if !m.is_deleted() => m,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Message not found"})),
            )
                .into_response()
        }
    };

    if !user.is_admin {
        if message.author_id != user.id {
            return (
                StatusCode::FORBIDDEN,
                Json(serde_json::json!({"error": "Not your message"})),
            )
                .into_response();
        }
        if !within_edit_window(&message.created_at) {
            let deletion_open =
                match settings::bool_setting(&state.db, settings::ALLOW_MESSAGE_DELETION).await {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::error!("Failed to read moderation settings: {:?}", e);
                        return (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(serde_json::json!({"error": "Lookup failed"})),
                        )
                            .into_response();
                    }
                };
            if !deletion_open {
                return (
                    StatusCode::FORBIDDEN,
                    Json(serde_json::json!({"error": "Deletion window has passed"})),
                )
                    .into_response();
            }
        }
    }

    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query("UPDATE messages SET deleted_at = ? WHERE id = ?")
        .bind(&now)
        .bind(message_id)
        .execute(&state.db)
        .await;

    if let Err(e) = result {
        tracing::error!("Failed to delete message: {:?}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to delete message"})),
        )
            .into_response();
    }

    state
        .bus
        .publish(
            message.channel_id,
            &ChatEvent::MessageDeleted {
                message_id,
                channel_id: message.channel_id,
            },
        )
        .await;

    Json(serde_json::json!({"ok": true})).into_response()
}
