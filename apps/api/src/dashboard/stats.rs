//! Read-only dashboard aggregation.
//!
//! Five independent reads over the status bridge and match results, each
//! filtered by the same score threshold and timeframe. Status partitioning
//! and deadline bucketing run in Rust over plain rows so they can be tested
//! without a database.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use tracing::instrument;

use crate::jobs::timeframe::Timeframe;
use crate::models::ids::{InternalUserId, LogicalUserId};
use crate::models::job::JobStatus;
use crate::users::repository::logical_id_for;

const TOP_SEARCH_LIMIT: i64 = 5;
const DEFAULT_ACTIVITY_DAYS: i64 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeadlineBucket {
    #[serde(rename = "Snarest")]
    Soonest,
    #[serde(rename = "I dag")]
    Today,
    #[serde(rename = "I morgen")]
    Tomorrow,
    #[serde(rename = "Denne uken")]
    ThisWeek,
    #[serde(rename = "Neste uke")]
    NextWeek,
    #[serde(rename = "Senere")]
    Later,
}

impl DeadlineBucket {
    /// Display order of the deadline chart.
    pub const ALL: [DeadlineBucket; 6] = [
        DeadlineBucket::Soonest,
        DeadlineBucket::Today,
        DeadlineBucket::Tomorrow,
        DeadlineBucket::ThisWeek,
        DeadlineBucket::NextWeek,
        DeadlineBucket::Later,
    ];

    /// Buckets a deadline relative to `today`. A missing deadline means
    /// "as soon as possible". Expired deadlines have no bucket.
    pub fn classify(frist: Option<NaiveDate>, today: NaiveDate) -> Option<Self> {
        let Some(frist) = frist else {
            return Some(DeadlineBucket::Soonest);
        };
        match (frist - today).num_days() {
            d if d < 0 => None,
            0 => Some(DeadlineBucket::Today),
            1 => Some(DeadlineBucket::Tomorrow),
            2..=7 => Some(DeadlineBucket::ThisWeek),
            8..=14 => Some(DeadlineBucket::NextWeek),
            _ => Some(DeadlineBucket::Later),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeadlineCount {
    pub bucket: DeadlineBucket,
    pub count: i64,
}

/// Counts per bucket in `DeadlineBucket::ALL` order, including empty buckets.
pub fn bucket_deadlines(deadlines: &[Option<NaiveDate>], today: NaiveDate) -> Vec<DeadlineCount> {
    let mut counts = DeadlineBucket::ALL.map(|bucket| DeadlineCount { bucket, count: 0 });
    for frist in deadlines {
        if let Some(bucket) = DeadlineBucket::classify(*frist, today) {
            if let Some(slot) = counts.iter_mut().find(|c| c.bucket == bucket) {
                slot.count += 1;
            }
        }
    }
    counts.to_vec()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub active: i64,
    pub applied: i64,
    pub not_relevant: i64,
    pub total: i64,
}

/// One status row joined with its match score, if scored.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StatusRow {
    pub applied_for: Option<NaiveDate>,
    pub matchscore: Option<i32>,
}

impl StatusCounts {
    /// Untouched rows only count as active when scored at or above
    /// `min_score`; actioned rows always count.
    pub fn tally(rows: &[StatusRow], min_score: i32) -> Self {
        let mut counts = StatusCounts::default();
        for row in rows {
            match JobStatus::from_applied_for(row.applied_for) {
                JobStatus::Untouched => {
                    if row.matchscore.is_some_and(|score| score >= min_score) {
                        counts.active += 1;
                    }
                }
                JobStatus::Applied => counts.applied += 1,
                JobStatus::NotRelevant => counts.not_relevant += 1,
            }
        }
        counts.total = counts.active + counts.applied + counts.not_relevant;
        counts
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SearchCount {
    pub name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DailyActivity {
    pub day: String,
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub status_counts: StatusCounts,
    pub top_searches: Vec<SearchCount>,
    pub daily_activity: Vec<DailyActivity>,
    pub deadline_stats: Vec<DeadlineCount>,
    pub scored_last_24h: i64,
}

impl DashboardStats {
    pub fn empty() -> Self {
        Self {
            status_counts: StatusCounts::default(),
            top_searches: Vec::new(),
            daily_activity: Vec::new(),
            deadline_stats: Vec::new(),
            scored_last_24h: 0,
        }
    }
}

/// Aggregates the dashboard for a user. An unknown user gets `DashboardStats::empty()`.
#[instrument(skip(pool))]
pub async fn get_dashboard_stats(
    pool: &PgPool,
    internal_id: InternalUserId,
    min_score: i32,
    timeframe: Timeframe,
) -> Result<DashboardStats, sqlx::Error> {
    let Some(user_id) = logical_id_for(pool, internal_id).await? else {
        return Ok(DashboardStats::empty());
    };

    let now = Utc::now();
    let since = timeframe.since(now);

    let status_rows = status_rows(pool, user_id, since).await?;
    let top_searches = top_searches(pool, internal_id, min_score, since).await?;
    let activity_since = since.unwrap_or(now - Duration::days(DEFAULT_ACTIVITY_DAYS));
    let daily_activity = daily_activity(pool, user_id, min_score, activity_since).await?;
    let deadline_stats = deadline_stats(pool, user_id, min_score, since).await?;
    let scored_last_24h = scored_since(pool, user_id, now - Duration::hours(24)).await?;

    Ok(DashboardStats {
        status_counts: StatusCounts::tally(&status_rows, min_score),
        top_searches,
        daily_activity,
        deadline_stats,
        scored_last_24h,
    })
}

async fn status_rows(
    pool: &PgPool,
    user_id: LogicalUserId,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<StatusRow>, sqlx::Error> {
    sqlx::query_as::<_, StatusRow>(
        r#"
        SELECT fus.applied_for, mr.matchscore
        FROM finn_job_user_status fus
        LEFT JOIN finn_job_match_result mr
            ON fus.finn_id = mr.job_id
            AND fus.user_id = mr.user_id
        WHERE fus.user_id = $1
          AND ($2::timestamptz IS NULL OR mr.created_at >= $2)
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(pool)
    .await
}

async fn top_searches(
    pool: &PgPool,
    internal_id: InternalUserId,
    min_score: i32,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<SearchCount>, sqlx::Error> {
    sqlx::query_as::<_, SearchCount>(
        r#"
        SELECT us.focus AS name, COUNT(mr.job_id) AS count
        FROM user_searches us
        JOIN finn_job_user_status fus ON us.id = fus.search_id
        JOIN finn_job_match_result mr
            ON fus.finn_id = mr.job_id
            AND fus.user_id = mr.user_id
        WHERE us.user_id = $1
          AND mr.matchscore >= $2
          AND ($3::timestamptz IS NULL OR mr.created_at >= $3)
        GROUP BY us.focus
        ORDER BY count DESC
        LIMIT $4
        "#,
    )
    .bind(internal_id)
    .bind(min_score)
    .bind(since)
    .bind(TOP_SEARCH_LIMIT)
    .fetch_all(pool)
    .await
}

async fn daily_activity(
    pool: &PgPool,
    user_id: LogicalUserId,
    min_score: i32,
    since: DateTime<Utc>,
) -> Result<Vec<DailyActivity>, sqlx::Error> {
    sqlx::query_as::<_, DailyActivity>(
        r#"
        SELECT
            TO_CHAR(created_at, 'Dy') AS day,
            TO_CHAR(created_at, 'YYYY-MM-DD') AS date,
            COUNT(*) AS count
        FROM finn_job_match_result
        WHERE user_id = $1
          AND matchscore >= $2
          AND created_at >= $3
        GROUP BY day, date
        ORDER BY date ASC
        "#,
    )
    .bind(user_id)
    .bind(min_score)
    .bind(since)
    .fetch_all(pool)
    .await
}

async fn deadline_stats(
    pool: &PgPool,
    user_id: LogicalUserId,
    min_score: i32,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<DeadlineCount>, sqlx::Error> {
    // One read of the database clock drives both the expiry filter and the buckets.
    let today: NaiveDate = sqlx::query_scalar("SELECT CURRENT_DATE")
        .fetch_one(pool)
        .await?;

    let deadlines: Vec<Option<NaiveDate>> = sqlx::query_scalar(
        r#"
        SELECT fj.frist
        FROM finn_jobs fj
        JOIN finn_job_match_result mr ON fj.finn_id = mr.job_id AND mr.user_id = $1
        JOIN finn_job_user_status fus ON fj.finn_id = fus.finn_id AND fus.user_id = $1
        WHERE fus.applied_for IS NULL
          AND mr.matchscore >= $2
          AND (fj.frist >= $4 OR fj.frist IS NULL)
          AND ($3::timestamptz IS NULL OR mr.created_at >= $3)
        "#,
    )
    .bind(user_id)
    .bind(min_score)
    .bind(since)
    .bind(today)
    .fetch_all(pool)
    .await?;

    Ok(bucket_deadlines(&deadlines, today))
}

async fn scored_since(
    pool: &PgPool,
    user_id: LogicalUserId,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM finn_job_match_result WHERE user_id = $1 AND created_at >= $2",
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(pool)
    .await
}
