use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::models::AuthUser;
use crate::AppState;

const SESSION_COOKIE: &str = "session_token=";

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.to_string());

        let cookie = parts
            .headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .split(';')
            .filter_map(|c| c.trim().strip_prefix(SESSION_COOKIE).map(|t| t.to_string()))
            .next();

        let token = match bearer.or(cookie) {
            Some(t) if !t.is_empty() => t,
            _ => {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "Not authenticated"})),
                )
                    .into_response())
            }
        };

        let row = sqlx::query_as::<_, (i64, String, i64, String)>(
            r#"SELECT u.id, u.username, u.is_admin, s.expires_at
               FROM sessions s
               JOIN users u ON u.id = s.user_id
               WHERE s.token = ?"#,
        )
        .bind(&token)
        .fetch_optional(&state.db)
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Database error"})),
            )
                .into_response()
        })?;

        let (user_id, username, is_admin, expires_at) = match row {
            Some(r) => r,
            None => {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "Invalid session"})),
                )
                    .into_response())
            }
        };

        let now = chrono::Utc::now().to_rfc3339();
        if expires_at < now {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({"error": "Session expired"})),
            )
                .into_response());
        }

        Ok(AuthUser {
            id: user_id,
            username,
            is_admin: is_admin != 0,
        })
    }
}
