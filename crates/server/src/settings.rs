//! Moderation policy switches consulted by the message lifecycle handlers.
//!
//! Settings are created lazily: a name with no row takes its hard-coded
//! default. Reads always hit the store so an administrator toggle applies to
//! the very next decision.

use sqlx::SqlitePool;

use crate::models::ModerationSetting;

pub const ALLOW_MESSAGE_DELETION: &str = "allow_message_deletion";

pub struct SettingDefault {
    pub name: &'static str,
    pub value: &'static str,
    pub description: &'static str,
}

pub static DEFAULTS: [SettingDefault; 1] = [SettingDefault {
    name: ALLOW_MESSAGE_DELETION,
    value: "false",
    description: "Allow users to delete their own messages after the edit window has passed",
}];

pub fn default_for(name: &str) -> Option<&'static SettingDefault> {
    DEFAULTS.iter().find(|d| d.name == name)
}

/// Read a boolean setting, falling back to its default. Unknown names read
/// as false.
pub async fn bool_setting(db: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let stored = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE name = ?")
        .bind(name)
        .fetch_optional(db)
        .await?;

    let value = match stored {
        Some(v) => v,
        None => match default_for(name) {
            Some(d) => d.value.to_string(),
            None => return Ok(false),
        },
    };

    Ok(matches!(value.as_str(), "true" | "1"))
}

/// All known settings, with defaults merged in for names never written.
pub async fn all_settings(db: &SqlitePool) -> Result<Vec<ModerationSetting>, sqlx::Error> {
    let mut items = Vec::with_capacity(DEFAULTS.len());
    for default in &DEFAULTS {
        let stored = sqlx::query_as::<_, ModerationSetting>(
            "SELECT name, value, description, updated_at FROM settings WHERE name = ?",
        )
        .bind(default.name)
        .fetch_optional(db)
        .await?;

        items.push(stored.unwrap_or_else(|| ModerationSetting {
            name: default.name.to_string(),
            value: default.value.to_string(),
            description: default.description.to_string(),
            updated_at: None,
        }));
    }
    Ok(items)
}

/// Upsert keyed by setting name.
pub async fn upsert_setting(
    db: &SqlitePool,
    name: &str,
    value: &str,
) -> Result<ModerationSetting, sqlx::Error> {
    let description = default_for(name).map(|d| d.description).unwrap_or("");
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT INTO settings (name, value, description, updated_at)
           VALUES (?, ?, ?, ?)
           ON CONFLICT(name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
    )
    .bind(name)
    .bind(value)
    .bind(description)
    .bind(&now)
    .execute(db)
    .await?;

    Ok(ModerationSetting {
        name: name.to_string(),
        value: value.to_string(),
        description: description.to_string(),
        updated_at: Some(now),
    })
}
