use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::cvs::storage::CvStorage;
use crate::mail::Mailer;
use crate::webhooks::WebhookDispatcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub webhooks: WebhookDispatcher,
    pub cv_storage: CvStorage,
    /// Resend when `RESEND_API_KEY` is set, otherwise a logging stand-in.
    pub mailer: Arc<dyn Mailer>,
}
