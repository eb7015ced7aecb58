use sqlx::SqlitePool;

use crate::models::{AuthUser, Channel, ChannelKind};

/// Whether `user` may read (subscribe to) `channel_id`.
///
/// Access derives from live organizational state and is evaluated fresh on
/// every call: membership can change between two otherwise-identical checks,
/// so nothing here is cached. Unknown channels and unknown kinds are denied.
/// Only store failures surface as errors.
pub async fn can_read(
    db: &SqlitePool,
    user: &AuthUser,
    channel_id: i64,
) -> Result<bool, sqlx::Error> {
    let channel = sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = ?")
        .bind(channel_id)
        .fetch_optional(db)
        .await?;

    let channel = match channel {
        Some(c) => c,
        None => return Ok(false),
    };

    let kind = match channel.kind() {
        Some(k) => k,
        None => return Ok(false),
    };

    match kind {
        ChannelKind::Broadcast => Ok(user.is_admin),
        ChannelKind::Dm => {
            Ok(channel.user_a_id == Some(user.id) || channel.user_b_id == Some(user.id))
        }
        ChannelKind::Department => {
            let ref_id = match channel.ref_id {
                Some(r) => r,
                None => return Ok(false),
            };
            let department = sqlx::query_scalar::<_, Option<i64>>(
                "SELECT department_id FROM users WHERE id = ?",
            )
            .bind(user.id)
            .fetch_optional(db)
            .await?
            .flatten();
            Ok(department == Some(ref_id))
        }
        ChannelKind::Team => {
            let ref_id = match channel.ref_id {
                Some(r) => r,
                None => return Ok(false),
            };
            let member = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM team_members WHERE team_id = ? AND user_id = ?",
            )
            .bind(ref_id)
            .bind(user.id)
            .fetch_one(db)
            .await?;
            Ok(member > 0)
        }
        ChannelKind::Project => {
            let ref_id = match channel.ref_id {
                Some(r) => r,
                None => return Ok(false),
            };
            let member = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM project_members WHERE project_id = ? AND user_id = ?",
            )
            .bind(ref_id)
            .bind(user.id)
            .fetch_one(db)
            .await?;
            Ok(member > 0)
        }
    }
}

/// Whether `user` may post into `channel_id`. Write access mirrors read
/// access for every channel kind, broadcast included.
pub async fn can_write(
    db: &SqlitePool,
    user: &AuthUser,
    channel_id: i64,
) -> Result<bool, sqlx::Error> {
    can_read(db, user, channel_id).await
}
