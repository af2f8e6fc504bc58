//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,

    /// HMAC secret for session tokens.
    pub session_secret: String,

    /// Role classification inputs.
    pub institution_domain: String,
    pub super_admin_emails: Vec<String>,
    pub approved_staff_emails: Vec<String>,

    /// Identity provider (OAuth) credentials.
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub oauth_redirect_url: String,

    /// Where the browser lands after a successful OAuth login,
    /// per-role paths are appended.
    pub frontend_url: String,

    /// Object storage for uploaded images.
    pub media_bucket_url: String,

    /// Outbound email. Optional; drive notifications are skipped when absent.
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub mail_from: Option<String>,
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

/// Splits a comma-separated env value into trimmed, non-empty entries.
fn csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = require("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Session and Role Policy ---
        let session_secret = require("SESSION_SECRET")?;
        if session_secret.len() < 16 {
            return Err(ConfigError::InvalidValue(
                "SESSION_SECRET".to_string(),
                "secret must be at least 16 bytes".to_string(),
            ));
        }
        let institution_domain = require("INSTITUTION_DOMAIN")?;
        let super_admin_emails = csv(&require("SUPER_ADMIN_EMAILS")?);
        let approved_staff_emails = std::env::var("APPROVED_STAFF_EMAILS")
            .map(|v| csv(&v))
            .unwrap_or_default();

        // --- Identity Provider ---
        let oauth_client_id = require("OAUTH_CLIENT_ID")?;
        let oauth_client_secret = require("OAUTH_CLIENT_SECRET")?;
        let oauth_redirect_url = require("OAUTH_REDIRECT_URL")?;
        let frontend_url =
            std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        // --- Object Storage and Email (optional collaborators) ---
        let media_bucket_url = std::env::var("MEDIA_BUCKET_URL")
            .unwrap_or_else(|_| "http://localhost:9000/placement-media".to_string());
        let smtp_host = std::env::var("SMTP_HOST").ok();
        let smtp_username = std::env::var("SMTP_USERNAME").ok();
        let smtp_password = std::env::var("SMTP_PASSWORD").ok();
        let mail_from = std::env::var("MAIL_FROM").ok();

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            session_secret,
            institution_domain,
            super_admin_emails,
            approved_staff_emails,
            oauth_client_id,
            oauth_client_secret,
            oauth_redirect_url,
            frontend_url,
            media_bucket_url,
            smtp_host,
            smtp_username,
            smtp_password,
            mail_from,
        })
    }
}
