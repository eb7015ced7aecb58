use crate::constants::*;

pub fn validate_message_body(body: &str) -> Result<(), String> {
    if body.trim().is_empty() {
        return Err("Message body is required".into());
    }
    if body.len() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

pub fn is_allowed_emoji(emoji: &str) -> bool {
    ALLOWED_REACTION_EMOJIS.contains(&emoji)
}
