//! FixHub configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FixHubConfig {
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

impl FixHubConfig {
    /// Load config from the default path (~/.fixhub/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::FixHubError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::FixHubError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FixHubError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the FixHub home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fixhub")
    }
}

/// Notification configuration: sender identity plus optional transport
/// credential blocks. Presence of a block's credentials decides whether that
/// adapter joins the fallback chain at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_from_email")]
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub mailgun: Option<MailgunConfig>,
    #[serde(default)]
    pub twilio: Option<TwilioConfig>,
}

fn default_from_email() -> String { "noreply@fixhub.app".into() }
fn default_from_name() -> String { "FixHub".into() }

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            from_email: default_from_email(),
            from_name: default_from_name(),
            smtp: None,
            mailgun: None,
            twilio: None,
        }
    }
}

impl NotifyConfig {
    /// Formatted sender, e.g. `FixHub <noreply@fixhub.app>`.
    pub fn sender(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

/// SMTP transport credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
}

fn default_smtp_port() -> u16 { 587 }

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        !self.host.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Mailgun HTTP API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailgunConfig {
    pub api_key: String,
    pub domain: String,
    #[serde(default = "default_mailgun_base")]
    pub base_url: String,
}

fn default_mailgun_base() -> String { "https://api.mailgun.net".into() }

impl MailgunConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.domain.is_empty()
    }
}

/// Twilio SMS credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_number.is_empty()
    }
}

/// Recurring task configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "bool_true")]
    pub weekly_report_enabled: bool,
    /// Three-letter weekday: mon, tue, wed, thu, fri, sat, sun.
    #[serde(default = "default_report_weekday")]
    pub weekly_report_weekday: String,
    #[serde(default = "default_report_hour")]
    pub weekly_report_hour: u32,
    #[serde(default)]
    pub weekly_report_minute: u32,
    #[serde(default = "bool_true")]
    pub cleanup_enabled: bool,
    #[serde(default = "default_cleanup_hour")]
    pub cleanup_hour: u32,
    #[serde(default)]
    pub cleanup_minute: u32,
    #[serde(default = "default_retention_days")]
    pub activity_retention_days: i64,
}

fn bool_true() -> bool { true }
fn default_report_weekday() -> String { "mon".into() }
fn default_report_hour() -> u32 { 9 }
fn default_cleanup_hour() -> u32 { 2 }
fn default_retention_days() -> i64 { 365 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weekly_report_enabled: true,
            weekly_report_weekday: default_report_weekday(),
            weekly_report_hour: default_report_hour(),
            weekly_report_minute: 0,
            cleanup_enabled: true,
            cleanup_hour: default_cleanup_hour(),
            cleanup_minute: 0,
            activity_retention_days: default_retention_days(),
        }
    }
}
