mod admin;
mod auth;
mod config;
mod cvs;
mod dashboard;
mod db;
mod errors;
mod jobs;
mod mail;
mod models;
mod routes;
mod searches;
mod state;
mod users;
mod webhooks;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::cvs::storage::CvStorage;
use crate::db::{create_pool, run_migrations};
use crate::mail::{LogMailer, Mailer, ResendMailer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::webhooks::WebhookDispatcher;

const OUTBOUND_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting job board API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    if config.run_migrations {
        run_migrations(&db).await?;
    }

    // Shared HTTP client for webhooks and mail
    let http = reqwest::Client::builder()
        .timeout(OUTBOUND_HTTP_TIMEOUT)
        .build()?;

    let webhooks = WebhookDispatcher::new(http.clone(), config.webhooks.clone());

    let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
        Some(key) => {
            info!("Password reset mail via Resend");
            Arc::new(ResendMailer::new(http, key.clone(), config.mail_from.clone()))
        }
        None => {
            warn!("RESEND_API_KEY not set; reset links will only be logged");
            Arc::new(LogMailer)
        }
    };

    let cv_storage = CvStorage::new(&config.cv_storage_dir);
    info!("CV files stored under {}", cv_storage.root().display());

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        webhooks,
        cv_storage,
        mailer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
