use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::Session;
use crate::cvs::extract::extract_cv_text;
use crate::cvs::repository::{delete_cv, insert_cv, list_cvs, set_primary_cv};
use crate::errors::{ActionResponse, AppError};
use crate::models::cv::{NewCv, UserCv};
use crate::state::AppState;
use crate::webhooks::WebhookTrigger;

const PDF_CONTENT_TYPE: &str = "application/pdf";

#[derive(Debug, Serialize)]
pub struct UploadCvResponse {
    pub success: bool,
    pub cv: UserCv,
}

/// GET /api/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    session: Option<Session>,
) -> Result<Json<Vec<UserCv>>, AppError> {
    let Some(session) = session else {
        return Ok(Json(Vec::new()));
    };
    Ok(Json(list_cvs(&state.db, session.internal_id).await?))
}

/// POST /api/cvs
///
/// Multipart upload with a single `file` field. Only PDFs are accepted.
pub async fn handle_upload_cv(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Json<UploadCvResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Ugyldig opplasting: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("cv.pdf").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Ugyldig opplasting: {e}")))?;
        upload = Some((filename, content_type, bytes));
        break;
    }

    let Some((filename, content_type, bytes)) = upload else {
        return Err(AppError::Validation("Ingen fil valgt".to_string()));
    };
    if content_type != PDF_CONTENT_TYPE {
        return Err(AppError::Validation("Kun PDF-filer er tillatt".to_string()));
    }

    info!("CV received: {filename} ({} bytes)", bytes.len());

    let path = state.cv_storage.save(&filename, &bytes).await?;
    let file_path = path.to_string_lossy().into_owned();
    let cv_text = extract_cv_text(bytes.clone()).await;

    let new_cv = NewCv {
        filename,
        file_path: file_path.clone(),
        content_type,
        file_size: bytes.len() as i64,
        cv_text,
    };

    let cv = match insert_cv(&state.db, session.internal_id, &new_cv).await {
        Ok(cv) => cv,
        Err(e) => {
            // No row references the file; don't leave it behind.
            state.cv_storage.remove(&file_path).await;
            return Err(e);
        }
    };

    if cv.is_primary {
        state
            .webhooks
            .dispatch(WebhookTrigger::cv_rescore(session.user_id));
    }

    Ok(Json(UploadCvResponse { success: true, cv }))
}

/// POST /api/cvs/:id/primary
pub async fn handle_set_primary_cv(
    State(state): State<AppState>,
    session: Session,
    Path(cv_id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    let user_id = set_primary_cv(&state.db, session.internal_id, cv_id).await?;

    info!("Triggering scoring webhook for user_id: {user_id}");
    state.webhooks.dispatch(WebhookTrigger::cv_rescore(user_id));

    Ok(ActionResponse::ok())
}

/// DELETE /api/cvs/:id
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    session: Session,
    Path(cv_id): Path<i32>,
) -> Result<Json<ActionResponse>, AppError> {
    let deleted = delete_cv(&state.db, session.internal_id, cv_id).await?;

    if deleted.was_primary {
        // Scoring restarts only when the user picks a primary explicitly.
        warn!(
            "User {} deleted their primary CV; newest CV promoted, matches cleared, scoring not triggered",
            session.user_id
        );
    }

    if let Some(path) = deleted.file_path {
        state.cv_storage.remove(&path).await;
    }

    Ok(ActionResponse::ok())
}
