use sqlx::{PgExecutor, PgPool};

use crate::errors::AppError;
use crate::models::ids::{InternalUserId, LogicalUserId};
use crate::models::user::{ProfileUpdate, User};

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM job_ai_users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_logical_id(
    pool: &PgPool,
    user_id: LogicalUserId,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM job_ai_users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Maps the internal id to the logical id shared with the scoring workflow.
/// Works on a pool or inside an open transaction.
pub async fn logical_id_for<'e, E>(
    executor: E,
    internal_id: InternalUserId,
) -> Result<Option<LogicalUserId>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_scalar::<_, LogicalUserId>("SELECT user_id FROM job_ai_users WHERE id = $1")
        .bind(internal_id)
        .fetch_optional(executor)
        .await
}

const EMAIL_CONSTRAINT: &str = "job_ai_users_email_key";

/// Inserts a user. The logical id is assigned as `max(user_id) + 1`.
///
/// The table lock makes concurrent registrations take turns computing the
/// next id. Plain reads and row locks are not blocked by it.
pub async fn create_user(pool: &PgPool, email: &str, password_hash: &str) -> Result<User, AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("LOCK TABLE job_ai_users IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO job_ai_users (email, password_hash, user_id)
        VALUES ($1, $2, (SELECT COALESCE(MAX(user_id), 0) + 1 FROM job_ai_users))
        RETURNING *
        "#,
    )
    .bind(email)
    .bind(password_hash)
    .fetch_one(&mut *tx)
    .await;

    match result {
        Ok(user) => {
            tx.commit().await?;
            Ok(user)
        }
        Err(sqlx::Error::Database(e))
            if e.is_unique_violation() && e.constraint() == Some(EMAIL_CONSTRAINT) =>
        {
            Err(AppError::Conflict("User already exists".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Updates only the profile fields present in `update`.
pub async fn update_profile(
    pool: &PgPool,
    user_id: LogicalUserId,
    update: &ProfileUpdate,
) -> Result<(), sqlx::Error> {
    if update.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        UPDATE job_ai_users
        SET fornavn   = COALESCE($1, fornavn),
            etternavn = COALESCE($2, etternavn),
            adresse   = COALESCE($3, adresse),
            postnr    = COALESCE($4, postnr),
            sted      = COALESCE($5, sted),
            mobil     = COALESCE($6, mobil)
        WHERE user_id = $7
        "#,
    )
    .bind(&update.fornavn)
    .bind(&update.etternavn)
    .bind(&update.adresse)
    .bind(&update.postnr)
    .bind(&update.sted)
    .bind(&update.mobil)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_password(pool: &PgPool, email: &str, password_hash: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE job_ai_users SET password_hash = $2 WHERE email = $1")
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    async fn test_logical_ids_are_sequential(pool: PgPool) {
        let first = create_user(&pool, "a@example.no", "hash").await.unwrap();
        let second = create_user(&pool, "b@example.no", "hash").await.unwrap();

        assert_eq!(second.user_id.0, first.user_id.0 + 1);
        assert_eq!(
            logical_id_for(&pool, second.id).await.unwrap(),
            Some(second.user_id)
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_duplicate_email_is_conflict(pool: PgPool) {
        create_user(&pool, "dup@example.no", "hash").await.unwrap();
        let err = create_user(&pool, "dup@example.no", "hash").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_concurrent_registrations_get_distinct_ids(pool: PgPool) {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = pool.clone();
                tokio::spawn(async move {
                    create_user(&pool, &format!("u{i}@example.no"), "hash").await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            let user = handle.await.unwrap().expect("distinct emails must all register");
            ids.push(user.user_id.0);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=8).collect::<Vec<i32>>());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_partial_profile_update(pool: PgPool) {
        let user = create_user(&pool, "p@example.no", "hash").await.unwrap();
        let first = ProfileUpdate {
            fornavn: Some("Kari".into()),
            sted: Some("Bergen".into()),
            ..Default::default()
        };
        update_profile(&pool, user.user_id, &first).await.unwrap();

        let second = ProfileUpdate {
            sted: Some("Oslo".into()),
            ..Default::default()
        };
        update_profile(&pool, user.user_id, &second).await.unwrap();

        let stored = get_user_by_logical_id(&pool, user.user_id).await.unwrap().unwrap();
        assert_eq!(stored.fornavn.as_deref(), Some("Kari"));
        assert_eq!(stored.sted.as_deref(), Some("Oslo"));
    }
}
