mod channel;
mod message;
mod setting;

pub use channel::*;
pub use message::*;
pub use setting::*;

use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub cursor: Option<String>,
    pub has_more: bool,
}

/// Resolved caller identity. `is_admin` is the privileged flag that bypasses
/// ownership and edit-window checks.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
}
