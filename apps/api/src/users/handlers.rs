use axum::{extract::State, Json};

use crate::auth::Session;
use crate::errors::{ActionResponse, AppError};
use crate::models::user::{ProfileUpdate, UserProfile};
use crate::state::AppState;
use crate::users::repository::{get_user_by_logical_id, update_profile};

/// GET /api/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    session: Option<Session>,
) -> Result<Json<Option<UserProfile>>, AppError> {
    let Some(session) = session else {
        return Ok(Json(None));
    };
    let user = get_user_by_logical_id(&state.db, session.user_id).await?;
    Ok(Json(user.map(UserProfile::from)))
}

/// PUT /api/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ActionResponse>, AppError> {
    update_profile(&state.db, session.user_id, &update).await?;
    Ok(ActionResponse::ok())
}
