use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use pulse_shared::validation::is_allowed_emoji;

use crate::models::{AuthUser, ReactionSummary};
use crate::stream::events::ChatEvent;
use crate::AppState;

#[derive(Deserialize)]
pub struct ReactionBody {
    pub emoji: String,
}

#[derive(Deserialize)]
pub struct ReactionQuery {
    pub emoji: Option<String>,
}

async fn message_channel(
    db: &sqlx::SqlitePool,
    message_id: i64,
) -> Result<Option<(i64, Option<String>)>, sqlx::Error> {
    sqlx::query_as::<_, (i64, Option<String>)>(
        "SELECT channel_id, deleted_at FROM messages WHERE id = ?",
    )
    .bind(message_id)
    .fetch_optional(db)
    .await
}

async fn emoji_count(db: &sqlx::SqlitePool, message_id: i64, emoji: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reactions WHERE message_id = ? AND emoji = ?")
        .bind(message_id)
        .bind(emoji)
        .fetch_one(db)
        .await
        .unwrap_or(0)
}

/// POST /api/messages/:messageId/reactions
pub async fn add_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<i64>,
    Json(payload): Json<ReactionBody>,
) -> impl IntoResponse {
    if !is_allowed_emoji(&payload.emoji) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Emoji not allowed"})),
        )
            .into_response();
    }

    let row = match message_channel(&state.db, message_id).await {
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

    // Deleted messages accept no new reactions.
    let channel_id = match row {
        Some((channel_id, None)) => channel_id,
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Message not found"})),
            )
                .into_response()
        }
    };

    let exists = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM reactions WHERE message_id = ? AND user_id = ? AND emoji = ?",
    )
    .bind(message_id)
    .bind(user.id)
    .bind(&payload.emoji)
    .fetch_one(&state.db)
    .await
    .unwrap_or(0);

    if exists > 0 {
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "Already reacted with this emoji"})),
        )
            .into_response();
    }

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query(
        "INSERT INTO reactions (message_id, user_id, emoji, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(message_id)
    .bind(user.id)
    .bind(&payload.emoji)
    .bind(&now)
    .execute(&state.db)
    .await;

    if let Err(e) = result {
        // A concurrent duplicate lands here through the primary key.
        tracing::debug!("Reaction insert rejected: {:?}", e);
        return (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "Already reacted with this emoji"})),
        )
            .into_response();
    }

    let count = emoji_count(&state.db, message_id, &payload.emoji).await;

    state
        .bus
        .publish(
            channel_id,
            &ChatEvent::ReactionAdded {
                message_id,
                user_id: user.id,
                emoji: payload.emoji.clone(),
                count,
            },
        )
        .await;

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "messageId": message_id,
            "emoji": payload.emoji,
            "count": count,
        })),
    )
        .into_response()
}

/// DELETE /api/messages/:messageId/reactions?emoji=...
pub async fn remove_reaction(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<i64>,
    Query(query): Query<ReactionQuery>,
) -> impl IntoResponse {
    let emoji = match query.emoji {
        Some(e) if is_allowed_emoji(&e) => e,
        Some(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Emoji not allowed"})),
            )
                .into_response()
        }
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Emoji is required"})),
            )
                .into_response()
        }
    };

    let row = match message_channel(&state.db, message_id).await {
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

    let channel_id = match row {
        Some((channel_id, _)) => channel_id,
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Message not found"})),
            )
                .into_response()
        }
    };

    let result =
        sqlx::query("DELETE FROM reactions WHERE message_id = ? AND user_id = ? AND emoji = ?")
            .bind(message_id)
            .bind(user.id)
            .bind(&emoji)
            .execute(&state.db)
            .await;

    match result {
        Ok(r) if r.rows_affected() > 0 => {}
        Ok(_) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"error": "Reaction not found"})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to remove reaction: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to remove reaction"})),
            )
                .into_response();
        }
    }

    let count = emoji_count(&state.db, message_id, &emoji).await;

    state
        .bus
        .publish(
            channel_id,
            &ChatEvent::ReactionRemoved {
                message_id,
                user_id: user.id,
                emoji: emoji.clone(),
                count,
            },
        )
        .await;

    Json(serde_json::json!({
        "messageId": message_id,
        "emoji": emoji,
        "count": count,
    }))
    .into_response()
}

/// GET /api/messages/:messageId/reactions
pub async fn get_reactions(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(message_id): Path<i64>,
) -> impl IntoResponse {
    let row = match message_channel(&state.db, message_id).await {
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

    if row.is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "Message not found"})),
        )
            .into_response();
    }

    let rows = sqlx::query_as::<_, (String, i64, String)>(
        r#"SELECT r.emoji, r.user_id, u.username
           FROM reactions r
           JOIN users u ON u.id = r.user_id
           WHERE r.message_id = ?
           ORDER BY r.created_at"#,
    )
    .bind(message_id)
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    let mut summaries: Vec<ReactionSummary> = Vec::new();
    for (emoji, user_id, username) in rows {
        if let Some(idx) = summaries.iter().position(|s| s.emoji == emoji) {
            let summary = &mut summaries[idx];
            summary.count += 1;
            summary.me = summary.me || user_id == user.id;
            summary.users.push(username);
        } else {
            summaries.push(ReactionSummary {
                emoji,
                count: 1,
                me: user_id == user.id,
                users: vec![username],
            });
        }
    }

    Json(summaries).into_response()
}
