pub mod messages;
pub mod reactions;
pub mod settings;

use crate::stream;
use crate::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Channel streams
        .route("/channels/{channelId}/stream", get(stream::session::open_stream))
        // Messages
        .route("/channels/{channelId}/messages", get(messages::list_messages))
        .route("/channels/{channelId}/messages", post(messages::create_message))
        .route("/messages/{messageId}", put(messages::edit_message))
        .route("/messages/{messageId}", delete(messages::delete_message))
        // Reactions
        .route("/messages/{messageId}/reactions", get(reactions::get_reactions))
        .route("/messages/{messageId}/reactions", post(reactions::add_reaction))
        .route("/messages/{messageId}/reactions", delete(reactions::remove_reaction))
        // Moderation settings
        .route("/settings", get(settings::get_settings))
        .route("/settings", put(settings::update_setting));

    Router::new().nest("/api", api_routes).with_state(state)
}
