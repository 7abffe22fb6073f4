//! Signed session and password-reset tokens.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::ids::{InternalUserId, LogicalUserId};

pub const SESSION_COOKIE: &str = "session";
const RESET_PURPOSE: &str = "reset";
const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// The authenticated caller, resolved from the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: LogicalUserId,
    pub internal_id: InternalUserId,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    user_id: LogicalUserId,
    internal_id: InternalUserId,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResetClaims {
    email: String,
    purpose: String,
    iat: i64,
    exp: i64,
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AppError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("create JWT: {e}")))
}

fn verify<T: for<'de> Deserialize<'de>>(token: &str, secret: &str) -> Result<T, AppError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<T>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("Rejected token: {e}");
            AppError::Unauthorized
        })
}

/// Creates a session token valid for `ttl`.
pub fn create_session_token(session: &Session, secret: &str, ttl: Duration) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = SessionClaims {
        user_id: session.user_id,
        internal_id: session.internal_id,
        iat: now.timestamp(),
        exp: (now + ttl).timestamp(),
    };
    sign(&claims, secret)
}

/// Verifies a session token. Any bad, expired or foreign token is `Unauthorized`.
pub fn verify_session_token(token: &str, secret: &str) -> Result<Session, AppError> {
    let claims: SessionClaims = verify(token, secret)?;
    Ok(Session {
        user_id: claims.user_id,
        internal_id: claims.internal_id,
    })
}

/// Creates a one-hour password reset token bound to an email address.
pub fn create_reset_token(email: &str, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = ResetClaims {
        email: email.to_string(),
        purpose: RESET_PURPOSE.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).timestamp(),
    };
    sign(&claims, secret)
}

/// Returns the email a reset token was issued for.
pub fn verify_reset_token(token: &str, secret: &str) -> Result<String, AppError> {
    let claims: ResetClaims = verify(token, secret)?;
    if claims.purpose != RESET_PURPOSE {
        return Err(AppError::Unauthorized);
    }
    Ok(claims.email)
}

/// Reads the session token out of the `Cookie` header, if present.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

pub fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        ttl.num_seconds()
    )
}

pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}
