use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use pulse_shared::constants::HEARTBEAT_INTERVAL_SECS;

use crate::authz;
use crate::models::AuthUser;
use crate::AppState;

use super::bus::sse_frame;

/// GET /api/channels/:channelId/stream
///
/// Long-lived event stream for one channel. Access is evaluated at open; a
/// caller whose membership is revoked keeps an already-open stream until it
/// reconnects.
pub async fn open_stream(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(channel_id): Path<i64>,
) -> Response {
    let readable = match authz::can_read(&state.db, &user, channel_id).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Channel lookup failed: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "Lookup failed"})),
            )
                .into_response();
        }
    };

    if !readable {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": "Not a member of this channel"})),
        )
            .into_response();
    }

    let subscription = state.bus.subscribe(channel_id).await;
    tracing::debug!(
        channel_id,
        listener_id = %subscription.id(),
        user_id = user.id,
        "stream opened"
    );

    // Keep-alives ride the same queue as real traffic so intermediaries see
    // bytes on an otherwise idle connection. First tick one interval in.
    let period = Duration::from_secs(HEARTBEAT_INTERVAL_SECS);
    let heartbeat = IntervalStream::new(tokio::time::interval_at(
        tokio::time::Instant::now() + period,
        period,
    ))
    .map(|_| heartbeat_frame());

    // Dropping the merged stream on disconnect stops the heartbeat and
    // deregisters the listener; each cleanup is independent of the other.
    let frames = subscription.merge(heartbeat).map(Ok::<_, Infallible>);

    match Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache, no-transform")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(frames))
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build stream response: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn heartbeat_frame() -> String {
    sse_frame("ping", &chrono::Utc::now().timestamp_millis().to_string())
}
