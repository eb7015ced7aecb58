use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::AuthUser;
use crate::settings;
use crate::AppState;

#[derive(Deserialize)]
pub struct UpdateSettingRequest {
    pub name: String,
    pub value: bool,
}

/// GET /api/settings
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> impl IntoResponse {
    if !user.is_admin {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Administrator access required"})),
        )
            .into_response();
    }

    match settings::all_settings(&state.db).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => {
            tracing::error!("Failed to load settings: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to load settings"})),
            )
                .into_response()
        }
    }
}

/// PUT /api/settings
pub async fn update_setting(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(payload): Json<UpdateSettingRequest>,
) -> impl IntoResponse {
    if !user.is_admin {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Administrator access required"})),
        )
            .into_response();
    }

    if settings::default_for(&payload.name).is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "Unknown setting"})),
        )
            .into_response();
    }

    let value = if payload.value { "true" } else { "false" };

    match settings::upsert_setting(&state.db, &payload.name, value).await {
        Ok(setting) => Json(setting).into_response(),
        Err(e) => {
            tracing::error!("Failed to update setting: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Failed to update setting"})),
            )
                .into_response()
        }
    }
}
