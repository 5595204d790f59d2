//! Configuration for the registration service.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Flat variable names used by existing deployments.
const STORAGE_CONNECTION_ENV: &str = "AZURE_STORAGE_CONNECTION_STRING";
const EMAIL_API_KEY_ENV: &str = "SENDGRID_API_KEY";
const EMAIL_FROM_ENV: &str = "SENDGRID_FROM_EMAIL";

/// Service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// CSV record storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Notification email configuration
    #[serde(default)]
    pub email: EmailConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the registration form, served at `/` when set
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Storage account connection string
    #[serde(default)]
    pub connection_string: Option<SecretString>,

    /// Keep the record in blob storage (if false, the record is in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,

    /// Container holding the record
    #[serde(default = "default_container")]
    pub container: String,

    /// Name of the CSV record blob
    #[serde(default = "default_blob")]
    pub blob: String,

    /// Upload attempts before giving up on a contended record
    #[serde(default = "default_max_append_attempts")]
    pub max_append_attempts: u32,

    /// Storage request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// SendGrid API key
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Sender address
    #[serde(default = "default_email_from")]
    pub from: String,

    /// Operations mailbox receiving registrations
    #[serde(default = "default_email_to")]
    pub to: String,

    /// SendGrid API base URL
    #[serde(default = "default_email_base_url")]
    pub base_url: String,

    /// Email request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Global requests per minute
    #[serde(default = "default_per_minute")]
    pub per_minute: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

// Default implementations
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
            static_dir: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connection_string: None,
            persist: true,
            container: default_container(),
            blob: default_blob(),
            max_append_attempts: default_max_append_attempts(),
            timeout: default_timeout(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            from: default_email_from(),
            to: default_email_to(),
            base_url: default_email_base_url(),
            timeout: default_timeout(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: default_per_minute(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_container() -> String {
    "event-participants".into()
}

fn default_blob() -> String {
    "participants.csv".into()
}

fn default_max_append_attempts() -> u32 {
    5
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_email_from() -> String {
    "noreply@aquis-capital.com".into()
}

fn default_email_to() -> String {
    "events@aquis-capital.com".into()
}

fn default_email_base_url() -> String {
    sendgrid_client::DEFAULT_BASE_URL.into()
}

fn default_per_minute() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .set_override_option(
                "storage.connection_string",
                std::env::var(STORAGE_CONNECTION_ENV).ok(),
            )?
            .set_override_option("email.api_key", std::env::var(EMAIL_API_KEY_ENV).ok())?
            .set_override_option("email.from", std::env::var(EMAIL_FROM_ENV).ok())?
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(config.server.static_dir.is_none());
        assert!(config.storage.persist);
        assert_eq!(config.storage.container, "event-participants");
        assert_eq!(config.storage.blob, "participants.csv");
        assert_eq!(config.storage.max_append_attempts, 5);
        assert!(config.storage.connection_string.is_none());
        assert_eq!(config.email.from, "noreply@aquis-capital.com");
        assert_eq!(config.email.to, "events@aquis-capital.com");
        assert_eq!(config.email.base_url, "https://api.sendgrid.com");
        assert_eq!(config.rate_limit.per_minute, 30);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_humantime_and_secrets() {
        let json = r#"{
            "storage": {"connection_string": "UseDevelopmentStorage=true", "timeout": "5s"},
            "email": {"api_key": "SG.key", "from": "events@example.com"}
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();

        assert_eq!(config.storage.timeout, Duration::from_secs(5));
        assert_eq!(
            config.storage.connection_string.as_ref().unwrap().expose_secret(),
            "UseDevelopmentStorage=true"
        );
        assert_eq!(config.email.from, "events@example.com");

        let debug = format!("{:?}", config);
        assert!(!debug.contains("SG.key"));
    }
}
