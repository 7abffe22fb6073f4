use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::auth::Session;
use crate::dashboard::scoring::{global_scoring_stats, GlobalScoringStats};
use crate::errors::{ActionResponse, AppError};
use crate::models::user::User;
use crate::state::AppState;
use crate::users::repository::get_user_by_logical_id;
use crate::webhooks::WebhookTrigger;

/// Loads the caller and checks `admin_user` against the database, not the
/// session, so revoked rights take effect immediately.
async fn require_admin(state: &AppState, session: &Session) -> Result<User, AppError> {
    match get_user_by_logical_id(&state.db, session.user_id).await? {
        Some(user) if user.admin_user => Ok(user),
        _ => {
            warn!("Unauthorized admin access attempt by user {}", session.user_id);
            Err(AppError::Forbidden)
        }
    }
}

/// POST /api/admin/rescore
pub async fn handle_global_rescore(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ActionResponse>, AppError> {
    let admin = require_admin(&state, &session).await?;

    let trigger = WebhookTrigger::global_rescore(&admin.email);
    if !state.webhooks.is_configured(&trigger) {
        return Err(AppError::ServiceUnavailable(
            "Server-konfigurasjon mangler".to_string(),
        ));
    }

    info!("Global rescoring triggered by {}", admin.email);
    state.webhooks.dispatch(trigger);

    Ok(ActionResponse::ok())
}

/// GET /api/admin/scoring-stats
pub async fn handle_global_scoring_stats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<GlobalScoringStats>, AppError> {
    require_admin(&state, &session).await?;
    Ok(Json(global_scoring_stats(&state.db).await?))
}
