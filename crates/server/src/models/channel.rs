use serde::{Deserialize, Serialize};

/// A conversation scope. Channels are provisioned by the org-management
/// modules; this crate only reads them to decide access.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: i64,
    pub kind: String,
    pub user_a_id: Option<i64>,
    pub user_b_id: Option<i64>,
    pub ref_id: Option<i64>,
    pub created_at: String,
}

impl Channel {
    pub fn kind(&self) -> Option<ChannelKind> {
        ChannelKind::parse(&self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Broadcast,
    Dm,
    Department,
    Team,
    Project,
}

impl ChannelKind {
    /// Unknown kinds map to None so access checks fail closed.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "broadcast" => Some(Self::Broadcast),
            "dm" => Some(Self::Dm),
            "department" => Some(Self::Department),
            "team" => Some(Self::Team),
            "project" => Some(Self::Project),
            _ => None,
        }
    }
}
