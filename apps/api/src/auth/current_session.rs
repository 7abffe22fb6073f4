use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use chrono::Duration;

use crate::auth::session::{
    create_session_token, session_cookie, token_from_headers, verify_session_token, Session,
};
use crate::errors::AppError;
use crate::state::AppState;

/// Resolves the session cookie into a `Session`.
///
/// Handlers that mutate take `Session` and reject anonymous callers with
/// `Unauthorized`. Read handlers take `Option<Session>` and fall back to an
/// empty result.
#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AppError::Unauthorized)?;
        verify_session_token(token, &state.config.session_secret)
    }
}

/// Re-issues the session cookie with a fresh expiry on every authenticated
/// request, unless the handler already set a cookie (login, logout).
pub async fn refresh_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let session = token_from_headers(request.headers())
        .and_then(|token| verify_session_token(token, &state.config.session_secret).ok());

    let mut response = next.run(request).await;

    let Some(session) = session else {
        return response;
    };
    if response.headers().contains_key(header::SET_COOKIE) {
        return response;
    }

    let ttl = Duration::hours(state.config.session_ttl_hours);
    match create_session_token(&session, &state.config.session_secret, ttl) {
        Ok(token) => {
            if let Ok(value) = HeaderValue::from_str(&session_cookie(&token, ttl)) {
                response.headers_mut().insert(header::SET_COOKIE, value);
            }
        }
        Err(e) => tracing::warn!("Could not refresh session for user {}: {e}", session.user_id),
    }
    response
}
