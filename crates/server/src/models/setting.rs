use serde::{Deserialize, Serialize};

/// One moderation policy switch. `updated_at` is None for settings still on
/// their hard-coded default.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ModerationSetting {
    pub name: String,
    pub value: String,
    pub description: String,
    pub updated_at: Option<String>,
}
