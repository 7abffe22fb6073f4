use anyhow::{Context, Result};

/// Outbound scoring-workflow endpoints. Each is optional; a missing URL
/// means that trigger is skipped with a warning.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub new_search_url: Option<String>,
    pub manual_job_url: Option<String>,
    pub cv_scoring_url: Option<String>,
    pub global_scoring_url: Option<String>,
    /// Shared secret sent in the `HeaderAuthWeebHook` header.
    pub token: Option<String>,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub port: u16,
    pub rust_log: String,
    pub cv_storage_dir: String,
    pub app_url: String,
    pub run_migrations: bool,
    pub webhooks: WebhookConfig,
    pub resend_api_key: Option<String>,
    pub mail_from: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            session_secret: require("SESSION_SECRET")?,
            session_ttl_hours: optional("SESSION_TTL_HOURS")
                .unwrap_or_else(|| "24".to_string())
                .parse::<i64>()
                .context("SESSION_TTL_HOURS must be a whole number of hours")?,
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            cv_storage_dir: optional("CV_STORAGE_DIR").unwrap_or_else(|| "storage/cvs".to_string()),
            app_url: optional("APP_URL")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            run_migrations: optional("RUN_MIGRATIONS")
                .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
            webhooks: WebhookConfig {
                new_search_url: optional("N8N_NEW_SEARCH_URL"),
                manual_job_url: optional("N8N_MANUAL_JOB_URL"),
                cv_scoring_url: optional("N8N_CV_SCORING_URL"),
                global_scoring_url: optional("N8N_GLOBAL_SCORING_URL"),
                token: optional("N8N_MANUAL_JOB_TOKEN"),
            },
            resend_api_key: optional("RESEND_API_KEY"),
            mail_from: optional("MAIL_FROM")
                .unwrap_or_else(|| "AI Job Board <no-reply@localhost>".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/jobs"),
            ("SESSION_SECRET", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.cv_storage_dir, "storage/cvs");
        assert!(config.run_migrations);
        assert!(config.webhooks.new_search_url.is_none());
        assert!(config.resend_api_key.is_none());
    }

    #[test]
    fn test_missing_required_variable() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("SESSION_SECRET"));
    }

    #[test]
    fn test_invalid_port_rejected() {
        let result = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SESSION_SECRET", "s"),
            ("PORT", "not-a-port"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_optional_values_are_unset() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("SESSION_SECRET", "s"),
            ("N8N_MANUAL_JOB_TOKEN", "  "),
            ("APP_URL", "https://jobs.example.com/"),
            ("RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();

        assert!(config.webhooks.token.is_none());
        assert_eq!(config.app_url, "https://jobs.example.com");
        assert!(!config.run_migrations);
    }
}
