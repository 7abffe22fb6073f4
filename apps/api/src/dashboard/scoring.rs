use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, instrument};

use crate::models::ids::{InternalUserId, LogicalUserId};
use crate::users::repository::logical_id_for;

/// Raw scoring progress for one user: known non-expired jobs versus
/// match results written by the workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobScoringStats {
    pub total: i64,
    pub completed: i64,
    pub missing_ids: Vec<i64>,
}

/// Progress as reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoringStatus {
    pub total: i64,
    pub completed: i64,
    pub percentage: i64,
    pub is_complete: bool,
    pub missing_ids: Vec<i64>,
}

impl ScoringStatus {
    /// Nothing to score: the progress bar is hidden.
    pub fn complete() -> Self {
        Self {
            total: 0,
            completed: 0,
            percentage: 100,
            is_complete: true,
            missing_ids: Vec::new(),
        }
    }
}

impl From<JobScoringStats> for ScoringStatus {
    fn from(stats: JobScoringStats) -> Self {
        if stats.total <= 0 {
            return ScoringStatus::complete();
        }
        // Match results can outlive their status rows, so completed may exceed total.
        let percentage = ((stats.completed as f64 / stats.total as f64) * 100.0).round() as i64;
        ScoringStatus {
            total: stats.total,
            completed: stats.completed,
            percentage: percentage.min(100),
            is_complete: stats.completed >= stats.total,
            missing_ids: stats.missing_ids,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GlobalScoringStats {
    pub total: i64,
    pub completed: i64,
}

#[instrument(skip(pool))]
pub async fn job_scoring_stats(
    pool: &PgPool,
    internal_id: InternalUserId,
) -> Result<JobScoringStats, sqlx::Error> {
    let Some(user_id) = logical_id_for(pool, internal_id).await? else {
        return Ok(JobScoringStats::default());
    };

    let total: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT fus.finn_id)
        FROM finn_job_user_status fus
        JOIN finn_jobs fj ON fus.finn_id = fj.finn_id
        WHERE fus.user_id = $1
          AND (fj.frist >= CURRENT_DATE OR fj.frist IS NULL)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let completed: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM finn_job_match_result WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    let missing_ids = missing_job_ids(pool, user_id).await?;

    Ok(JobScoringStats {
        total,
        completed,
        missing_ids,
    })
}

async fn missing_job_ids(pool: &PgPool, user_id: LogicalUserId) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT fus.finn_id
        FROM finn_job_user_status fus
        JOIN finn_jobs fj ON fus.finn_id = fj.finn_id
        WHERE fus.user_id = $1
          AND (fj.frist >= CURRENT_DATE OR fj.frist IS NULL)
        EXCEPT
        SELECT job_id FROM finn_job_match_result WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Scoring progress for the dashboard. Failures degrade to "complete" so a
/// broken query never blocks the page.
pub async fn scoring_status(pool: &PgPool, internal_id: InternalUserId) -> ScoringStatus {
    match job_scoring_stats(pool, internal_id).await {
        Ok(stats) => stats.into(),
        Err(e) => {
            error!("Error getting scoring status: {e}");
            ScoringStatus::complete()
        }
    }
}

/// Candidate (user, job) pairs across all users with a primary CV, and how
/// many of them already have a match result.
#[instrument(skip(pool))]
pub async fn global_scoring_stats(pool: &PgPool) -> Result<GlobalScoringStats, sqlx::Error> {
    let (total, pending): (i64, i64) = sqlx::query_as(
        r#"
        SELECT
            COUNT(*),
            COUNT(*) FILTER (
                WHERE NOT EXISTS (
                    SELECT 1 FROM finn_job_match_result mr
                    WHERE mr.user_id = fus.user_id AND mr.job_id = fus.finn_id
                )
            )
        FROM user_cvs cv
        JOIN job_ai_users u ON cv.user_id = u.id
        JOIN finn_job_user_status fus ON fus.user_id = u.user_id
        JOIN finn_jobs fj ON fus.finn_id = fj.finn_id
        WHERE cv.is_primary = true
          AND (fj.frist >= CURRENT_DATE OR fj.frist IS NULL)
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(GlobalScoringStats {
        total,
        completed: total - pending,
    })
}
