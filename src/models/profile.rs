use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One-to-one companion of a user. Only ever created by the registration workflow.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub photo: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}
