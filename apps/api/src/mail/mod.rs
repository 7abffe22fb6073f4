//! Outbound email for password resets.
//!
//! `AppState` holds an `Arc<dyn Mailer>`: `ResendMailer` when an API key is
//! configured, otherwise `LogMailer`, which only writes the message to the log.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

const RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Sends mail through the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl ResendMailer {
    pub fn new(client: Client, api_key: String, from: String) -> Self {
        Self::with_base_url(client, api_key, from, RESEND_API_URL.to_string())
    }

    pub fn with_base_url(client: Client, api_key: String, from: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            from,
            base_url,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let body = ResendRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        info!("Email sent to: {}", email.to);
        Ok(())
    }
}

/// Fallback used when no mail provider is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            "Mail delivery not configured; would send '{}' to {}: {}",
            email.subject, email.to, email.html
        );
        Ok(())
    }
}

/// Builds the password reset email for `reset_link`.
pub fn password_reset_email(to: &str, reset_link: &str) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Tilbakestill passord".to_string(),
        html: format!(
            "<p>Du har bedt om å tilbakestille passordet ditt.</p>\
             <p>Klikk her for å lage nytt passord: <a href=\"{reset_link}\">{reset_link}</a></p>\
             <p>Linken er gyldig i 1 time.</p>"
        ),
    }
}
