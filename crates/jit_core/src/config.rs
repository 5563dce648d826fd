//! Runtime configuration for the notification pipeline.
//!
//! # Responsibility
//! - Load mail, site and logging settings from TOML.
//! - Reject settings the dispatcher or logger cannot work with.
//!
//! # Invariants
//! - A missing config file yields defaults, never an error.
//! - `validate` is the only place that decides whether settings are usable.

use crate::logging::default_log_level;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_FROM_ADDRESS: &str = "noreply@localhost";
const DEFAULT_DOMAIN: &str = "localhost";
const DEFAULT_LOG_DIR_NAME: &str = "jit-logs";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email regex")
});

/// Returns whether `address` looks like a deliverable e-mail address.
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_RE.is_match(address.trim())
}

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Sender identity attached to every outgoing message.
    pub from_address: String,
    /// When false the dispatcher never reaches the delivery channel.
    pub allow_send: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            allow_send: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Host used to build absolute links to portal pages.
    pub domain: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: DEFAULT_DOMAIN.to_string(),
        }
    }
}

impl SiteConfig {
    /// Joins `path` onto `http://{domain}`.
    pub fn absolute_url(&self, path: &str) -> String {
        let domain = self.domain.trim().trim_end_matches('/');
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("http://{domain}/{}", path.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: std::env::temp_dir().join(DEFAULT_LOG_DIR_NAME),
        }
    }
}

/// Top-level settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JitConfig {
    pub mail: MailConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
}

impl JitConfig {
    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: JitConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads settings from `path`; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks that the sender, domain and log directory are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mail.from_address.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "mail.from_address cannot be empty".to_string(),
            ));
        }
        if !is_valid_email(&self.mail.from_address) {
            return Err(ConfigError::Invalid(format!(
                "mail.from_address `{}` is not an e-mail address",
                self.mail.from_address
            )));
        }
        if self.site.domain.trim().is_empty() {
            return Err(ConfigError::Invalid("site.domain cannot be empty".to_string()));
        }
        if !self.logging.dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "logging.dir must be an absolute path, got `{}`",
                self.logging.dir.display()
            )));
        }
        Ok(())
    }
}
