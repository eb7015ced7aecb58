pub const APP_NAME: &str = "Pulse";

// Limits
pub const MAX_MESSAGE_LENGTH: usize = 4000;

pub const MESSAGE_PAGE_SIZE: i64 = 50;

/// How long the author of a message may edit or delete it without the
/// moderation override.
pub const MESSAGE_EDIT_WINDOW_SECS: i64 = 15 * 60;

// Streaming
pub const HEARTBEAT_INTERVAL_SECS: u64 = 15;
pub const LISTENER_BUFFER_SIZE: usize = 64;

/// Closed set of reaction glyphs accepted by the API. Anything else is
/// rejected before it reaches the store.
pub const ALLOWED_REACTION_EMOJIS: [&str; 20] = [
    "👍", "👎", "❤️", "😂", "😮", "😢", "😡", "🎉", "🔥", "👀", "✅", "❌",
    "💯", "🙏", "👏", "🚀", "🤔", "😴", "🤖", "💡",
];
