use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::Session;
use crate::errors::{ActionResponse, AppError};
use crate::jobs::finn::extract_finn_code;
use crate::jobs::repository::{job_known_to_user, matched_jobs, record_decision, JobDecision};
use crate::jobs::timeframe::Timeframe;
use crate::models::job::{JobStatus, MatchedJob};
use crate::state::AppState;
use crate::webhooks::WebhookTrigger;

pub const DEFAULT_MIN_SCORE: i32 = 70;

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub min_score: Option<i32>,
    pub timeframe: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: MatchedJob,
    pub status: JobStatus,
}

#[derive(Debug, Deserialize)]
pub struct ManualJobRequest {
    pub url: String,
}

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    session: Option<Session>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Vec<JobListing>>, AppError> {
    let Some(session) = session else {
        return Ok(Json(Vec::new()));
    };

    let min_score = query.min_score.unwrap_or(DEFAULT_MIN_SCORE);
    let since = Timeframe::from_query(query.timeframe.as_deref()).since(Utc::now());
    let jobs = matched_jobs(&state.db, session.user_id, min_score, since).await?;

    Ok(Json(
        jobs.into_iter()
            .map(|job| JobListing {
                status: job.status(),
                job,
            })
            .collect(),
    ))
}

/// POST /api/jobs/:finn_id/applied
pub async fn handle_mark_applied(
    State(state): State<AppState>,
    session: Session,
    Path(finn_id): Path<i64>,
) -> Result<Json<ActionResponse>, AppError> {
    record_decision(&state.db, session.user_id, finn_id, JobDecision::Applied).await?;
    Ok(ActionResponse::ok())
}

/// POST /api/jobs/:finn_id/not-relevant
pub async fn handle_mark_not_relevant(
    State(state): State<AppState>,
    session: Session,
    Path(finn_id): Path<i64>,
) -> Result<Json<ActionResponse>, AppError> {
    record_decision(&state.db, session.user_id, finn_id, JobDecision::NotRelevant).await?;
    Ok(ActionResponse::ok())
}

/// POST /api/jobs/manual
///
/// Submits a single finn.no job for scoring outside any saved search.
pub async fn handle_manual_job(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ManualJobRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let url = request.url.trim();
    let job_id = extract_finn_code(url).map_err(|e| AppError::Validation(e.to_string()))?;
    let finn_id: i64 = job_id
        .parse()
        .map_err(|_| AppError::Validation("Klarte ikke finne Finn-kode i lenken".to_string()))?;

    if job_known_to_user(&state.db, session.user_id, finn_id).await? {
        return Err(AppError::Conflict(
            "Denne jobben er allerede analysert for deg.".to_string(),
        ));
    }

    let trigger = WebhookTrigger::manual_job(session.user_id, url, job_id);
    if !state.webhooks.is_configured(&trigger) {
        return Err(AppError::ServiceUnavailable(
            "Server-konfigurasjon mangler".to_string(),
        ));
    }

    info!("Triggering manual analysis of job {job_id} for user {}", session.user_id);
    state.webhooks.dispatch(trigger);

    Ok(ActionResponse::ok())
}
