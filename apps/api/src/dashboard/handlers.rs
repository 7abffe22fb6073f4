use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::auth::Session;
use crate::dashboard::scoring::{scoring_status, ScoringStatus};
use crate::dashboard::stats::{get_dashboard_stats, DashboardStats};
use crate::errors::AppError;
use crate::jobs::handlers::DEFAULT_MIN_SCORE;
use crate::jobs::timeframe::Timeframe;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    pub min_score: Option<i32>,
    pub timeframe: Option<String>,
}

/// GET /api/dashboard/stats
pub async fn handle_dashboard_stats(
    State(state): State<AppState>,
    session: Option<Session>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardStats>, AppError> {
    let Some(session) = session else {
        return Ok(Json(DashboardStats::empty()));
    };

    let stats = get_dashboard_stats(
        &state.db,
        session.internal_id,
        query.min_score.unwrap_or(DEFAULT_MIN_SCORE),
        Timeframe::from_query(query.timeframe.as_deref()),
    )
    .await?;

    Ok(Json(stats))
}

/// GET /api/dashboard/scoring-status
pub async fn handle_scoring_status(
    State(state): State<AppState>,
    session: Option<Session>,
) -> Json<ScoringStatus> {
    match session {
        Some(session) => Json(scoring_status(&state.db, session.internal_id).await),
        None => Json(ScoringStatus::complete()),
    }
}
