use sqlx::PgPool;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::ids::InternalUserId;
use crate::models::search::{UserSearch, UserSearchWithStats};
use crate::users::repository::logical_id_for;

/// Saved searches with scoring statistics, newest first. Statistics go
/// through the status bridge because match results carry no search id.
pub async fn list_searches(
    pool: &PgPool,
    internal_id: InternalUserId,
) -> Result<Vec<UserSearchWithStats>, sqlx::Error> {
    sqlx::query_as::<_, UserSearchWithStats>(
        r#"
        SELECT
            us.*,
            ROUND(AVG(mr.score::float))::int AS avg_relevans_score,
            ROUND(AVG(mr.matchscore::float))::int AS avg_relevans_matchscore,
            COUNT(DISTINCT CASE WHEN mr.created_at >= NOW() - INTERVAL '24 hours' THEN mr.job_id END)::int
                AS scored_last_24h
        FROM user_searches us
        LEFT JOIN finn_job_user_status fus ON us.id = fus.search_id
        LEFT JOIN finn_job_match_result mr
            ON fus.finn_id = mr.job_id
            AND fus.user_id = mr.user_id
        WHERE us.user_id = $1
        GROUP BY us.id
        ORDER BY us.created_at DESC
        "#,
    )
    .bind(internal_id)
    .fetch_all(pool)
    .await
}

pub async fn add_search(
    pool: &PgPool,
    internal_id: InternalUserId,
    focus: &str,
    q_param: &str,
    url: &str,
) -> Result<UserSearch, sqlx::Error> {
    sqlx::query_as::<_, UserSearch>(
        r#"
        INSERT INTO user_searches (user_id, focus, q_param, url, aktiv)
        VALUES ($1, $2, $3, $4, true)
        RETURNING *
        "#,
    )
    .bind(internal_id)
    .bind(focus)
    .bind(q_param)
    .bind(url)
    .fetch_one(pool)
    .await
}

pub async fn set_search_active(
    pool: &PgPool,
    internal_id: InternalUserId,
    search_id: i32,
    aktiv: bool,
) -> Result<(), AppError> {
    let updated = sqlx::query("UPDATE user_searches SET aktiv = $3 WHERE id = $1 AND user_id = $2")
        .bind(search_id)
        .bind(internal_id)
        .bind(aktiv)
        .execute(pool)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(AppError::NotFound(format!("Search {search_id} not found")));
    }
    Ok(())
}

/// Deletes a search together with the status rows it produced that the user
/// never acted on. Applied and not-relevant rows, and all match results, stay.
#[instrument(skip(pool))]
pub async fn delete_search(pool: &PgPool, internal_id: InternalUserId, search_id: i32) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    let user_id = logical_id_for(&mut *tx, internal_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let removed = sqlx::query(
        r#"
        DELETE FROM finn_job_user_status
        WHERE search_id = $1
          AND user_id = $2
          AND applied_for IS NULL
        "#,
    )
    .bind(search_id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let deleted = sqlx::query("DELETE FROM user_searches WHERE id = $1 AND user_id = $2")
        .bind(search_id)
        .bind(internal_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(AppError::NotFound(format!("Search {search_id} not found")));
    }

    tx.commit().await?;
    info!("Deleted search {search_id} and {removed} untouched job rows for user {user_id}");
    Ok(())
}
