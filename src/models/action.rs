use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the append-only 'actions' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Action {
    pub id: i64,
    pub user_id: i64,
    pub verb: String,
    pub target_type: String,
    pub target_id: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// The object an action was performed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Image(i64),
}

impl Target {
    pub fn kind(&self) -> &'static str {
        match self {
            Target::Image(_) => "image",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Target::Image(id) => *id,
        }
    }
}
