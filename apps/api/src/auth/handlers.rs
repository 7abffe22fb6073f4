use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::session::{
    clear_session_cookie, create_reset_token, create_session_token, session_cookie, verify_reset_token,
    Session,
};
use crate::errors::{ActionResponse, AppError};
use crate::mail::password_reset_email;
use crate::models::user::{User, UserProfile};
use crate::state::AppState;
use crate::users::repository::{create_user, get_user_by_email, update_password};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserProfile,
}

impl Credentials {
    fn normalized(self) -> Result<(String, String), AppError> {
        let email = self.email.trim().to_lowercase();
        if email.is_empty() || self.password.is_empty() {
            return Err(AppError::Validation("Mangler obligatoriske felt".to_string()));
        }
        Ok((email, self.password))
    }
}

/// Issues the session cookie for `user` alongside the profile body.
fn logged_in(state: &AppState, user: User) -> Result<Response, AppError> {
    let session = Session {
        user_id: user.user_id,
        internal_id: user.id,
    };
    let ttl = Duration::hours(state.config.session_ttl_hours);
    let token = create_session_token(&session, &state.config.session_secret, ttl)?;

    let body = AuthResponse {
        success: true,
        user: user.into(),
    };
    Ok(([(header::SET_COOKIE, session_cookie(&token, ttl))], Json(body)).into_response())
}

/// POST /api/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let (email, password) = credentials.normalized()?;

    if get_user_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let password_hash = hash_password_blocking(password).await?;
    let user = create_user(&state.db, &email, &password_hash).await?;
    info!("Registered user {} ({})", user.user_id, user.email);

    logged_in(&state, user)
}

/// POST /api/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, AppError> {
    let (email, password) = credentials.normalized()?;

    let Some(user) = get_user_by_email(&state.db, &email).await? else {
        return Err(AppError::InvalidCredentials);
    };
    if user.password_hash.is_empty()
        || !verify_password_blocking(password, user.password_hash.clone()).await
    {
        return Err(AppError::InvalidCredentials);
    }

    logged_in(&state, user)
}

/// POST /api/auth/logout
pub async fn handle_logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        ActionResponse::ok(),
    )
}

/// POST /api/auth/forgot-password
///
/// Always reports success for unknown addresses so the endpoint cannot be
/// used to probe for accounts.
pub async fn handle_forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let email = request.email.trim().to_lowercase();
    if get_user_by_email(&state.db, &email).await?.is_none() {
        return Ok(ActionResponse::ok());
    }

    let token = create_reset_token(&email, &state.config.session_secret)?;
    let link = format!("{}/reset-password?token={token}", state.config.app_url);

    if let Err(e) = state.mailer.send(&password_reset_email(&email, &link)).await {
        error!("Password reset email failed: {e}");
        return Err(AppError::ServiceUnavailable("Kunne ikke sende e-post.".to_string()));
    }

    Ok(ActionResponse::ok())
}

/// POST /api/auth/reset-password
pub async fn handle_reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let email = verify_reset_token(&request.token, &state.config.session_secret)
        .map_err(|_| AppError::Validation("Ugyldig eller utløpt lenke.".to_string()))?;
    if request.password.is_empty() {
        return Err(AppError::Validation("Mangler obligatoriske felt".to_string()));
    }

    let password_hash = hash_password_blocking(request.password).await?;
    if update_password(&state.db, &email, &password_hash).await? == 0 {
        warn!("Password reset for unknown account {email}");
    }

    Ok(ActionResponse::ok())
}
