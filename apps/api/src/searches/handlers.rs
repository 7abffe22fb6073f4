use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::Session;
use crate::errors::{ActionResponse, AppError};
use crate::models::search::{NewSearchRequest, UserSearchWithStats};
use crate::searches::repository::{add_search, delete_search, list_searches, set_search_active};
use crate::state::AppState;
use crate::webhooks::WebhookTrigger;

#[derive(Debug, Deserialize)]
pub struct ToggleSearchRequest {
    pub aktiv: bool,
}

/// GET /api/searches
pub async fn handle_list_searches(
    State(state): State<AppState>,
    session: Option<Session>,
) -> Result<Json<Vec<UserSearchWithStats>>, AppError> {
    let Some(session) = session else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(list_searches(&state.db, session.internal_id).await?))
}

/// POST /api/searches
///
/// Saves the search, then asks the workflow to start scraping it.
pub async fn handle_save_search(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<NewSearchRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let focus = request.focus.as_deref().map(str::trim).unwrap_or_default();
    let url = request.url.as_deref().map(str::trim).unwrap_or_default();
    if focus.is_empty() || url.is_empty() {
        return Err(AppError::Validation("Mangler obligatoriske felt".to_string()));
    }

    // q_param is derived by the workflow from the URL.
    let search = add_search(&state.db, session.internal_id, focus, "", url).await?;

    let trigger = WebhookTrigger::new_search(
        session.user_id,
        search.id,
        &search.url,
        &search.q_param,
        &search.focus,
    );
    if state.webhooks.is_configured(&trigger) {
        info!("Triggering search analysis webhook for search: {}", search.id);
        state.webhooks.dispatch(trigger);
    } else {
        warn!("New-search webhook not configured; search {} will wait for the next scheduled run", search.id);
    }

    Ok(ActionResponse::ok())
}

/// PATCH /api/searches/:id
pub async fn handle_toggle_search(
    State(state): State<AppState>,
    session: Session,
    Path(search_id): Path<i32>,
    Json(request): Json<ToggleSearchRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    set_search_active(&state.db, session.internal_id, search_id, request.aktiv).await?;
    Ok(ActionResponse::ok())
}

/// DELETE /api/searches/:id
pub async fn handle_delete_search(
    State(state): State<AppState>,
    session: Session,
    Path(search_id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    delete_search(&state.db, session.internal_id, search_id).await?;
    Ok(ActionResponse::ok())
}
