use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::models::ids::LogicalUserId;
use crate::models::job::{MatchedJob, NOT_RELEVANT_DATE};

/// What the user decided about a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobDecision {
    Applied,
    NotRelevant,
}

impl JobDecision {
    /// Value bound into `applied_for`; `None` lets the database use today.
    fn applied_for(self) -> Option<NaiveDate> {
        match self {
            JobDecision::Applied => None,
            JobDecision::NotRelevant => Some(NOT_RELEVANT_DATE),
        }
    }
}

/// Scored, non-expired jobs known to the user, best match first and
/// earliest deadline next (open-ended deadlines first).
pub async fn matched_jobs(
    pool: &PgPool,
    user_id: LogicalUserId,
    min_score: i32,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<MatchedJob>, sqlx::Error> {
    sqlx::query_as::<_, MatchedJob>(
        r#"
        SELECT
            fj.finn_id,
            mr.matchscore,
            fj.frist,
            fj.frist_type,
            fj.company,
            fj.job_title,
            fj.job_text_html,
            fj.job_url,
            fj.contact1_name,
            fj.contact1_title,
            fj.contact1_phone,
            fj.contact2_name,
            fj.contact2_title,
            fj.contact2_phone,
            st.applied_for,
            mr.yes_1, mr.yes_2, mr.yes_3, mr.yes_4, mr.yes_5,
            mr.no_1, mr.no_2, mr.no_3, mr.no_4, mr.no_5,
            mr.recommend_apply
        FROM finn_jobs fj
        JOIN finn_job_match_result mr ON fj.finn_id = mr.job_id
        JOIN finn_job_user_status st ON fj.finn_id = st.finn_id AND st.user_id = $2
        WHERE mr.user_id = $2
          AND (fj.frist >= CURRENT_DATE OR fj.frist IS NULL)
          AND mr.matchscore >= $1
          AND ($3::timestamptz IS NULL OR mr.created_at >= $3)
        ORDER BY mr.matchscore DESC, fj.frist ASC NULLS FIRST
        "#,
    )
    .bind(min_score)
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

/// Records the user's decision on a job, creating the status row if needed.
pub async fn record_decision(
    pool: &PgPool,
    user_id: LogicalUserId,
    finn_id: i64,
    decision: JobDecision,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO finn_job_user_status (user_id, finn_id, applied_for)
        VALUES ($1, $2, COALESCE($3, CURRENT_DATE))
        ON CONFLICT (user_id, finn_id)
        DO UPDATE SET applied_for = EXCLUDED.applied_for
        "#,
    )
    .bind(user_id)
    .bind(finn_id)
    .bind(decision.applied_for())
    .execute(pool)
    .await?;
    Ok(())
}

/// Whether the job is already known to the user (found by a search or submitted before).
pub async fn job_known_to_user(pool: &PgPool, user_id: LogicalUserId, finn_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM finn_job_user_status WHERE user_id = $1 AND finn_id = $2)",
    )
    .bind(user_id)
    .bind(finn_id)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;

    #[test]
    fn test_decision_dates() {
        assert_eq!(JobDecision::Applied.applied_for(), None);
        assert_eq!(
            JobStatus::from_applied_for(JobDecision::NotRelevant.applied_for()),
            JobStatus::NotRelevant
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_decisions_upsert(pool: PgPool) {
        let user = LogicalUserId(1);
        assert!(!job_known_to_user(&pool, user, 12_345_678).await.unwrap());

        record_decision(&pool, user, 12_345_678, JobDecision::NotRelevant).await.unwrap();
        record_decision(&pool, user, 12_345_678, JobDecision::Applied).await.unwrap();

        assert!(job_known_to_user(&pool, user, 12_345_678).await.unwrap());
        let dates: Vec<Option<NaiveDate>> =
            sqlx::query_scalar("SELECT applied_for FROM finn_job_user_status WHERE user_id = $1")
                .bind(user)
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(dates.len(), 1);
        assert_eq!(JobStatus::from_applied_for(dates[0]), JobStatus::Applied);
    }
}
