use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::ids::InternalUserId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSearch {
    pub id: i32,
    pub user_id: InternalUserId,
    pub focus: String,
    pub q_param: String,
    pub url: String,
    pub aktiv: bool,
    pub created_at: DateTime<Utc>,
}

/// A saved search with its scoring statistics, as listed on the dashboard.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSearchWithStats {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub search: UserSearch,
    pub avg_relevans_score: Option<i32>,
    pub avg_relevans_matchscore: Option<i32>,
    pub scored_last_24h: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSearchRequest {
    pub focus: Option<String>,
    pub url: Option<String>,
}
