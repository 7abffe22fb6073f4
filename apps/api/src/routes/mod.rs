pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post},
    Router,
};

use crate::admin::handlers as admin;
use crate::auth::current_session::refresh_session;
use crate::auth::handlers as auth;
use crate::cvs::handlers as cvs;
use crate::dashboard::handlers as dashboard;
use crate::jobs::handlers as jobs;
use crate::searches::handlers as searches;
use crate::state::AppState;
use crate::users::handlers as users;

/// Upper bound on a CV upload request.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Auth
        .route("/auth/register", post(auth::handle_register))
        .route("/auth/login", post(auth::handle_login))
        .route("/auth/logout", post(auth::handle_logout))
        .route("/auth/forgot-password", post(auth::handle_forgot_password))
        .route("/auth/reset-password", post(auth::handle_reset_password))
        .route(
            "/profile",
            get(users::handle_get_profile).put(users::handle_update_profile),
        )
        // CVs
        .route(
            "/cvs",
            get(cvs::handle_list_cvs)
                .post(cvs::handle_upload_cv)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/cvs/:id/primary", post(cvs::handle_set_primary_cv))
        .route("/cvs/:id", delete(cvs::handle_delete_cv))
        // Searches
        .route(
            "/searches",
            get(searches::handle_list_searches).post(searches::handle_save_search),
        )
        .route(
            "/searches/:id",
            patch(searches::handle_toggle_search).delete(searches::handle_delete_search),
        )
        // Jobs
        .route("/jobs", get(jobs::handle_list_jobs))
        .route("/jobs/manual", post(jobs::handle_manual_job))
        .route("/jobs/:finn_id/applied", post(jobs::handle_mark_applied))
        .route(
            "/jobs/:finn_id/not-relevant",
            post(jobs::handle_mark_not_relevant),
        )
        // Dashboard
        .route("/dashboard/stats", get(dashboard::handle_dashboard_stats))
        .route(
            "/dashboard/scoring-status",
            get(dashboard::handle_scoring_status),
        )
        // Admin
        .route("/admin/rescore", post(admin::handle_global_rescore))
        .route(
            "/admin/scoring-stats",
            get(admin::handle_global_scoring_stats),
        )
        .layer(middleware::from_fn_with_state(state.clone(), refresh_session));

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use chrono::Duration;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::PgPool;
    use std::path::Path;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::session::{create_session_token, Session};
    use crate::config::Config;
    use crate::cvs::storage::CvStorage;
    use crate::mail::LogMailer;
    use crate::models::ids::{InternalUserId, LogicalUserId};
    use crate::users::repository::create_user;
    use crate::webhooks::WebhookDispatcher;

    const SECRET: &str = "router-test-secret";

    fn state_with(db: PgPool, cv_root: &Path) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost:1/unused".to_string()),
            "SESSION_SECRET" => Some(SECRET.to_string()),
            _ => None,
        })
        .unwrap();

        AppState {
            db,
            webhooks: WebhookDispatcher::new(reqwest::Client::new(), config.webhooks.clone()),
            cv_storage: CvStorage::new(cv_root),
            mailer: Arc::new(LogMailer),
            config,
        }
    }

    /// State whose pool never connects; only routes that stay off the
    /// database can be exercised with it.
    fn test_state() -> AppState {
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        state_with(db, &std::env::temp_dir().join("jobboard-router-test"))
    }

    fn cookie_for(session: &Session) -> String {
        let token = create_session_token(session, SECRET, Duration::hours(1)).unwrap();
        format!("session={token}")
    }

    fn session_cookie_header() -> String {
        cookie_for(&Session {
            user_id: LogicalUserId(1),
            internal_id: InternalUserId(1),
        })
    }

    const BOUNDARY: &str = "jobboard-test-boundary";

    fn upload_request(cookie: &str, field: &str, content_type: &str, data: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"cv.pdf\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/api/cvs")
            .header(header::COOKIE, cookie)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn stored_files(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = build_router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_mutation_without_session_is_unauthorized() {
        let response = build_router(test_state())
            .oneshot(
                Request::post("/api/jobs/123456789/applied")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_read_without_session_is_empty() {
        let response = build_router(test_state())
            .oneshot(Request::get("/api/jobs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_tampered_session_is_unauthorized() {
        let response = build_router(test_state())
            .oneshot(
                Request::post("/api/cvs/1/primary")
                    .header(header::COOKIE, "session=not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_finn_url_is_rejected_before_any_lookup() {
        let response = build_router(test_state())
            .oneshot(
                Request::post("/api/jobs/manual")
                    .header(header::COOKIE, session_cookie_header())
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"url":"https://example.com/job/1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        // Authenticated responses carry a refreshed session cookie.
        assert!(response.headers().contains_key(header::SET_COOKIE));
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Må være en gyldig finn.no lenke");
    }

    #[tokio::test]
    async fn test_logout_clears_cookie() {
        let response = build_router(test_state())
            .oneshot(
                Request::post("/api/auth/logout")
                    .header(header::COOKIE, session_cookie_header())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let db = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap();
        let request = upload_request(&session_cookie_header(), "file", "text/plain", b"not a pdf");

        let response = build_router(state_with(db, dir.path()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Kun PDF-filer er tillatt");
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let request = upload_request(&session_cookie_header(), "attachment", "application/pdf", b"%PDF-1.4");

        let response = build_router(test_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Ingen fil valgt");
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upload_removes_file_when_insert_fails(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        // No such user: the insert transaction fails after the file is written.
        let cookie = cookie_for(&Session {
            user_id: LogicalUserId(404),
            internal_id: InternalUserId(404),
        });
        let request = upload_request(&cookie, "file", "application/pdf", b"%PDF-1.4 broken");

        let response = build_router(state_with(pool, dir.path()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(stored_files(dir.path()), 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_first_upload_is_stored_as_primary(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let user = create_user(&pool, "upload@example.no", "hash").await.unwrap();
        let cookie = cookie_for(&Session {
            user_id: user.user_id,
            internal_id: user.id,
        });
        let request = upload_request(&cookie, "file", "application/pdf", b"%PDF-1.4 broken");

        let response = build_router(state_with(pool, dir.path()))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["cv"]["is_primary"], true);
        assert_eq!(body["cv"]["filename"], "cv.pdf");
        assert_eq!(stored_files(dir.path()), 1);
    }
}
