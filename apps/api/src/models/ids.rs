//! User identifiers.
//!
//! Every user has two keys: the surrogate primary key of `job_ai_users`
//! (referenced by `user_cvs` and `user_searches`) and the logical `user_id`
//! shared with the scoring workflow (referenced by `finn_job_match_result`
//! and `finn_job_user_status`). They are separate types so a query can never
//! bind one where the other belongs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Surrogate key, `job_ai_users.id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct InternalUserId(pub i32);

/// External key, `job_ai_users.user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct LogicalUserId(pub i32);

impl fmt::Display for InternalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal:{}", self.0)
    }
}

impl fmt::Display for LogicalUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
