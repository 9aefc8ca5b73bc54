use std::{path::PathBuf, time::Duration};

use thiserror::Error;

use crate::{scheduler::DEFAULT_DELETION_DELAY, ApiToken};

/// Per-request HTTP timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Settings for a [`crate::BotClient`]. Loaded once at startup and never
/// changed afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token from @BotFather.
    pub token: ApiToken,

    /// Default chat for outgoing messages: a numeric id or `@channelusername`.
    pub chat_id: String,

    /// Per-request HTTP timeout.
    pub timeout: Duration,

    /// Where `process_updates` writes downloaded files.
    pub download_dir: PathBuf,

    /// How long a downloaded file lives before it is deleted.
    pub deletion_delay: Duration,
}

impl Config {
    pub fn new(token: impl Into<ApiToken>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            timeout: DEFAULT_TIMEOUT,
            download_dir: PathBuf::from("."),
            deletion_delay: DEFAULT_DELETION_DELAY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn with_deletion_delay(mut self, delay: Duration) -> Self {
        self.deletion_delay = delay;
        self
    }

    /// Reads the configuration from the process environment:
    ///
    /// - `TELEGRAM_TOKEN` (required)
    /// - `TELEGRAM_CHAT_ID` (required)
    /// - `TELEGRAM_TIMEOUT_S` (optional, seconds)
    /// - `TELEGRAM_DOWNLOAD_DIR` (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], but reads keys through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let mut config = Self::new(required("TELEGRAM_TOKEN")?, required("TELEGRAM_CHAT_ID")?);

        if let Some(value) = lookup("TELEGRAM_TIMEOUT_S") {
            let secs = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or(ConfigError::Invalid {
                    key: "TELEGRAM_TIMEOUT_S",
                    value: value.clone(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(dir) = lookup("TELEGRAM_DOWNLOAD_DIR").filter(|d| !d.is_empty()) {
            config.download_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}
