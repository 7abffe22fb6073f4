use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::ids::InternalUserId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserCv {
    pub id: i32,
    pub user_id: InternalUserId,
    pub filename: String,
    /// Storage path on disk; internal, not sent to clients.
    #[serde(skip_serializing)]
    pub file_path: Option<String>,
    pub content_type: Option<String>,
    pub file_size: Option<i64>,
    #[serde(skip_serializing)]
    pub cv_text: Option<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

/// Metadata for a CV about to be inserted.
#[derive(Debug, Clone)]
pub struct NewCv {
    pub filename: String,
    pub file_path: String,
    pub content_type: String,
    pub file_size: i64,
    pub cv_text: String,
}

/// Outcome of a committed CV deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedCv {
    pub file_path: Option<String>,
    pub was_primary: bool,
}
