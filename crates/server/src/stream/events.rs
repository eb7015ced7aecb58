use serde::Serialize;

use crate::models::Message;

/// Events fanned out to channel subscribers. The variant name maps to the
/// `event:` field of the wire frame; the serialized payload is its `data:`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatEvent {
    Message(Message),
    #[serde(rename_all = "camelCase")]
    MessageUpdated {
        message_id: i64,
        body: String,
        updated_at: String,
    },
    #[serde(rename_all = "camelCase")]
    MessageDeleted {
        message_id: i64,
        channel_id: i64,
    },
    #[serde(rename_all = "camelCase")]
    ReactionAdded {
        message_id: i64,
        user_id: i64,
        emoji: String,
        count: i64,
    },
    #[serde(rename_all = "camelCase")]
    ReactionRemoved {
        message_id: i64,
        user_id: i64,
        emoji: String,
        count: i64,
    },
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Message(_) => "message",
            ChatEvent::MessageUpdated { .. } => "message_updated",
            ChatEvent::MessageDeleted { .. } => "message_deleted",
            ChatEvent::ReactionAdded { .. } => "reaction_added",
            ChatEvent::ReactionRemoved { .. } => "reaction_removed",
        }
    }
}
