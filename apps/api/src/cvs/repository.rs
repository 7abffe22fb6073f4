use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::cv::{DeletedCv, NewCv, UserCv};
use crate::models::ids::{InternalUserId, LogicalUserId};

/// Locks the user's row for the rest of the transaction and returns the
/// logical id. Serialises concurrent CV changes for the same user.
async fn lock_user(
    tx: &mut Transaction<'_, Postgres>,
    internal_id: InternalUserId,
) -> Result<LogicalUserId, AppError> {
    sqlx::query_scalar::<_, LogicalUserId>(
        "SELECT user_id FROM job_ai_users WHERE id = $1 FOR UPDATE",
    )
    .bind(internal_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Match results are scored against the primary CV; once it changes they are stale.
async fn clear_match_results(
    tx: &mut Transaction<'_, Postgres>,
    user_id: LogicalUserId,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM finn_job_match_result WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected())
}

/// All CVs for a user, newest first.
pub async fn list_cvs(pool: &PgPool, internal_id: InternalUserId) -> Result<Vec<UserCv>, sqlx::Error> {
    sqlx::query_as::<_, UserCv>(
        "SELECT * FROM user_cvs WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(internal_id)
    .fetch_all(pool)
    .await
}

/// Inserts a CV. The user's first CV becomes primary.
#[instrument(skip(pool, cv), fields(filename = %cv.filename))]
pub async fn insert_cv(pool: &PgPool, internal_id: InternalUserId, cv: &NewCv) -> Result<UserCv, AppError> {
    let mut tx = pool.begin().await?;
    lock_user(&mut tx, internal_id).await?;

    let inserted = sqlx::query_as::<_, UserCv>(
        r#"
        INSERT INTO user_cvs (user_id, filename, file_path, content_type, file_size, cv_text, is_primary)
        VALUES ($1, $2, $3, $4, $5, $6, NOT EXISTS (SELECT 1 FROM user_cvs WHERE user_id = $1))
        RETURNING *
        "#,
    )
    .bind(internal_id)
    .bind(&cv.filename)
    .bind(&cv.file_path)
    .bind(&cv.content_type)
    .bind(cv.file_size)
    .bind(&cv.cv_text)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(inserted)
}

/// Makes `cv_id` the user's only primary CV and drops every match result
/// scored against the previous one, atomically.
///
/// Returns `NotFound` (and leaves everything untouched) if the CV is not the
/// user's.
#[instrument(skip(pool))]
pub async fn set_primary_cv(
    pool: &PgPool,
    internal_id: InternalUserId,
    cv_id: i32,
) -> Result<LogicalUserId, AppError> {
    let mut tx = pool.begin().await?;
    let user_id = lock_user(&mut tx, internal_id).await?;

    sqlx::query("UPDATE user_cvs SET is_primary = false WHERE user_id = $1")
        .bind(internal_id)
        .execute(&mut *tx)
        .await?;

    let updated = sqlx::query("UPDATE user_cvs SET is_primary = true WHERE id = $1 AND user_id = $2")
        .bind(cv_id)
        .bind(internal_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if updated == 0 {
        return Err(AppError::NotFound(format!("CV {cv_id} not found")));
    }

    let cleared = clear_match_results(&mut tx, user_id).await?;
    tx.commit().await?;

    info!("CV {cv_id} is now primary for user {user_id}; cleared {cleared} match results");
    Ok(user_id)
}

/// Deletes a CV. Refuses to delete the last one. If the deleted CV was
/// primary, the newest remaining CV is promoted and match results cleared.
///
/// The stored file is left for the caller to remove after commit.
#[instrument(skip(pool))]
pub async fn delete_cv(pool: &PgPool, internal_id: InternalUserId, cv_id: i32) -> Result<DeletedCv, AppError> {
    let mut tx = pool.begin().await?;
    let user_id = lock_user(&mut tx, internal_id).await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_cvs WHERE user_id = $1")
        .bind(internal_id)
        .fetch_one(&mut *tx)
        .await?;
    if count <= 1 {
        return Err(AppError::LastCv);
    }

    let (file_path, was_primary): (Option<String>, bool) =
        sqlx::query_as("SELECT file_path, is_primary FROM user_cvs WHERE id = $1 AND user_id = $2")
            .bind(cv_id)
            .bind(internal_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("CV not found".to_string()))?;

    sqlx::query("DELETE FROM user_cvs WHERE id = $1 AND user_id = $2")
        .bind(cv_id)
        .bind(internal_id)
        .execute(&mut *tx)
        .await?;

    if was_primary {
        sqlx::query(
            r#"
            UPDATE user_cvs
            SET is_primary = true
            WHERE id = (
                SELECT id FROM user_cvs
                WHERE user_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            )
            "#,
        )
        .bind(internal_id)
        .execute(&mut *tx)
        .await?;

        clear_match_results(&mut tx, user_id).await?;
    }

    tx.commit().await?;

    Ok(DeletedCv {
        file_path,
        was_primary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repository::create_user;

    fn new_cv(name: &str) -> NewCv {
        NewCv {
            filename: name.to_string(),
            file_path: format!("/tmp/{name}"),
            content_type: "application/pdf".to_string(),
            file_size: 1024,
            cv_text: "Erfaring".to_string(),
        }
    }

    async fn add_match(pool: &PgPool, user_id: LogicalUserId, job_id: i64) {
        sqlx::query("INSERT INTO finn_job_match_result (user_id, job_id, matchscore) VALUES ($1, $2, 80)")
            .bind(user_id)
            .bind(job_id)
            .execute(pool)
            .await
            .unwrap();
    }

    async fn match_count(pool: &PgPool, user_id: LogicalUserId) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM finn_job_match_result WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    fn primaries(cvs: &[UserCv]) -> Vec<i32> {
        cvs.iter().filter(|cv| cv.is_primary).map(|cv| cv.id).collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_first_upload_becomes_primary(pool: PgPool) {
        let user = create_user(&pool, "cv@example.no", "hash").await.unwrap();
        let a = insert_cv(&pool, user.id, &new_cv("a.pdf")).await.unwrap();
        let b = insert_cv(&pool, user.id, &new_cv("b.pdf")).await.unwrap();

        assert!(a.is_primary);
        assert!(!b.is_primary);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_primary_switch_then_delete_old(pool: PgPool) {
        let user = create_user(&pool, "switch@example.no", "hash").await.unwrap();
        let a = insert_cv(&pool, user.id, &new_cv("a.pdf")).await.unwrap();
        let b = insert_cv(&pool, user.id, &new_cv("b.pdf")).await.unwrap();
        add_match(&pool, user.user_id, 111_111_111).await;

        set_primary_cv(&pool, user.id, b.id).await.unwrap();
        assert_eq!(match_count(&pool, user.user_id).await, 0);
        assert_eq!(primaries(&list_cvs(&pool, user.id).await.unwrap()), vec![b.id]);

        // A is no longer primary, so deleting it must not touch match results.
        add_match(&pool, user.user_id, 222_222_222).await;
        let deleted = delete_cv(&pool, user.id, a.id).await.unwrap();
        assert!(!deleted.was_primary);
        assert_eq!(deleted.file_path.as_deref(), Some("/tmp/a.pdf"));

        let remaining = list_cvs(&pool, user.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(primaries(&remaining), vec![b.id]);
        assert_eq!(match_count(&pool, user.user_id).await, 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_last_cv_cannot_be_deleted(pool: PgPool) {
        let user = create_user(&pool, "last@example.no", "hash").await.unwrap();
        let only = insert_cv(&pool, user.id, &new_cv("only.pdf")).await.unwrap();

        let err = delete_cv(&pool, user.id, only.id).await.unwrap_err();
        assert!(matches!(err, AppError::LastCv));
        assert_eq!(list_cvs(&pool, user.id).await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_deleting_primary_promotes_newest(pool: PgPool) {
        let user = create_user(&pool, "promote@example.no", "hash").await.unwrap();
        let a = insert_cv(&pool, user.id, &new_cv("a.pdf")).await.unwrap();
        let _b = insert_cv(&pool, user.id, &new_cv("b.pdf")).await.unwrap();
        let c = insert_cv(&pool, user.id, &new_cv("c.pdf")).await.unwrap();
        add_match(&pool, user.user_id, 333_333_333).await;

        let deleted = delete_cv(&pool, user.id, a.id).await.unwrap();
        assert!(deleted.was_primary);
        assert_eq!(primaries(&list_cvs(&pool, user.id).await.unwrap()), vec![c.id]);
        assert_eq!(match_count(&pool, user.user_id).await, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_foreign_cv_cannot_become_primary(pool: PgPool) {
        let owner = create_user(&pool, "owner@example.no", "hash").await.unwrap();
        let other = create_user(&pool, "other@example.no", "hash").await.unwrap();
        let mine = insert_cv(&pool, owner.id, &new_cv("mine.pdf")).await.unwrap();
        let theirs = insert_cv(&pool, other.id, &new_cv("theirs.pdf")).await.unwrap();
        add_match(&pool, owner.user_id, 444_444_444).await;

        let err = set_primary_cv(&pool, owner.id, theirs.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Rolled back: the owner keeps their primary and their matches.
        assert_eq!(primaries(&list_cvs(&pool, owner.id).await.unwrap()), vec![mine.id]);
        assert_eq!(match_count(&pool, owner.user_id).await, 1);
    }
}
