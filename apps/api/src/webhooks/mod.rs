//! Outbound triggers for the external scoring workflow.
//!
//! Every trigger is dispatched on a detached task. Its outcome is only
//! logged: the database change that preceded it stands regardless of what
//! the workflow endpoint answers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::WebhookConfig;
use crate::models::ids::LogicalUserId;

/// Header carrying the shared secret expected by the workflow endpoints.
pub const WEBHOOK_AUTH_HEADER: &str = "HeaderAuthWeebHook";
/// `search_id` sent for jobs submitted by URL rather than found by a search.
pub const MANUAL_JOB_SEARCH_ID: i32 = 999_999;
/// Grace period so the workflow sees the committed search row.
pub const NEW_SEARCH_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("no URL configured for the {0} webhook")]
    NotConfigured(&'static str),
}

#[derive(Debug, Clone, Serialize)]
pub struct NewSearchPayload {
    pub user_id: LogicalUserId,
    pub search_id: i32,
    pub url: String,
    pub q_param: String,
    pub focus: String,
    pub action: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualJobPayload {
    pub user_id: LogicalUserId,
    pub search_id: i32,
    pub original_url: String,
    pub job_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CvRescorePayload {
    pub user_id: LogicalUserId,
}

#[derive(Debug, Clone, Serialize)]
pub struct GlobalRescorePayload {
    #[serde(rename = "triggeredBy")]
    pub triggered_by: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum WebhookTrigger {
    NewSearch(NewSearchPayload),
    ManualJob(ManualJobPayload),
    CvRescore(CvRescorePayload),
    GlobalRescore(GlobalRescorePayload),
}

impl WebhookTrigger {
    pub fn new_search(user_id: LogicalUserId, search_id: i32, url: &str, q_param: &str, focus: &str) -> Self {
        WebhookTrigger::NewSearch(NewSearchPayload {
            user_id,
            search_id,
            url: url.to_string(),
            q_param: q_param.to_string(),
            focus: focus.to_string(),
            action: "new_search",
        })
    }

    pub fn manual_job(user_id: LogicalUserId, original_url: &str, job_id: &str) -> Self {
        WebhookTrigger::ManualJob(ManualJobPayload {
            user_id,
            search_id: MANUAL_JOB_SEARCH_ID,
            original_url: original_url.to_string(),
            job_id: job_id.to_string(),
        })
    }

    pub fn cv_rescore(user_id: LogicalUserId) -> Self {
        WebhookTrigger::CvRescore(CvRescorePayload { user_id })
    }

    pub fn global_rescore(triggered_by: &str) -> Self {
        WebhookTrigger::GlobalRescore(GlobalRescorePayload {
            triggered_by: triggered_by.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WebhookTrigger::NewSearch(_) => "new-search",
            WebhookTrigger::ManualJob(_) => "manual-job",
            WebhookTrigger::CvRescore(_) => "cv-rescore",
            WebhookTrigger::GlobalRescore(_) => "global-rescore",
        }
    }

    pub fn delay(&self) -> Duration {
        match self {
            WebhookTrigger::NewSearch(_) => NEW_SEARCH_DELAY,
            _ => Duration::ZERO,
        }
    }

    fn url<'a>(&self, config: &'a WebhookConfig) -> Option<&'a str> {
        match self {
            WebhookTrigger::NewSearch(_) => config.new_search_url.as_deref(),
            WebhookTrigger::ManualJob(_) => config.manual_job_url.as_deref(),
            WebhookTrigger::CvRescore(_) => config.cv_scoring_url.as_deref(),
            WebhookTrigger::GlobalRescore(_) => config.global_scoring_url.as_deref(),
        }
    }

    fn body(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            WebhookTrigger::NewSearch(p) => serde_json::to_value(p),
            WebhookTrigger::ManualJob(p) => serde_json::to_value(p),
            WebhookTrigger::CvRescore(p) => serde_json::to_value(p),
            WebhookTrigger::GlobalRescore(p) => serde_json::to_value(p),
        }
    }
}

#[derive(Clone)]
pub struct WebhookDispatcher {
    client: Client,
    config: Arc<WebhookConfig>,
}

impl WebhookDispatcher {
    pub fn new(client: Client, config: WebhookConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// True when the trigger has a URL and, where the workflow requires it, a token.
    pub fn is_configured(&self, trigger: &WebhookTrigger) -> bool {
        let needs_token = matches!(
            trigger,
            WebhookTrigger::NewSearch(_) | WebhookTrigger::ManualJob(_)
        );
        trigger.url(&self.config).is_some() && (!needs_token || self.config.token.is_some())
    }

    /// Posts the trigger and waits for the response.
    pub async fn send(&self, trigger: &WebhookTrigger) -> Result<(), WebhookError> {
        let url = trigger
            .url(&self.config)
            .ok_or(WebhookError::NotConfigured(trigger.kind()))?;

        let body = trigger.body()?;

        let mut request = self.client.post(url).json(&body);
        if let Some(token) = &self.config.token {
            request = request.header(WEBHOOK_AUTH_HEADER, token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Fires the trigger on a detached task. The handle is only useful to
    /// tests; callers drop it.
    pub fn dispatch(&self, trigger: WebhookTrigger) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let delay = trigger.delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match dispatcher.send(&trigger).await {
                Ok(()) => info!("{} webhook triggered successfully", trigger.kind()),
                Err(WebhookError::NotConfigured(kind)) => {
                    warn!("Skipping {kind} webhook: no URL configured")
                }
                Err(e) => error!("Failed to trigger {} webhook: {e}", trigger.kind()),
            }
        })
    }
}
