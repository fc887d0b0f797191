//! Append-only activity stream: who did what to which object.

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::action::{Action, Target},
};

/// Same actor, verb and target within this window count as one action.
const DUPLICATE_WINDOW_SECS: i64 = 60;

/// Records an action, returning `false` when it was suppressed as a duplicate.
pub async fn record(
    pool: &SqlitePool,
    user_id: i64,
    verb: &str,
    target: Target,
) -> Result<bool, AppError> {
    let now = Utc::now();

    let last: Option<(chrono::DateTime<Utc>,)> = sqlx::query_as(
        r#"
        SELECT created_at FROM actions
        WHERE user_id = ? AND verb = ? AND target_type = ? AND target_id = ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(verb)
    .bind(target.kind())
    .bind(target.id())
    .fetch_optional(pool)
    .await?;

    if let Some((created_at,)) = last {
        if now - created_at < Duration::seconds(DUPLICATE_WINDOW_SECS) {
            tracing::debug!(user_id, verb, target_id = target.id(), "duplicate action skipped");
            return Ok(false);
        }
    }

    sqlx::query(
        r#"
        INSERT INTO actions (user_id, verb, target_type, target_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(verb)
    .bind(target.kind())
    .bind(target.id())
    .bind(now)
    .execute(pool)
    .await?;

    Ok(true)
}

/// The user's own actions, newest first.
pub async fn recent_for_user(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<Action>, AppError> {
    let actions = sqlx::query_as::<_, Action>(
        r#"
        SELECT id, user_id, verb, target_type, target_id, created_at
        FROM actions
        WHERE user_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(actions)
}
