//! Configuration for one digest run.
//!
//! Values come from an optional TOML file (`~/.config/tech-digest/config.toml`)
//! overlaid by environment variables, which take precedence. A missing file
//! yields `Config::default()`. Nothing here touches the network; [`Config::check`]
//! is the pipeline's ConfigCheck stage.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::slack::{MessageStyle, DEFAULT_API_BASE_URL, DEFAULT_TEXT_LIMIT};
use crate::summarize::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::util::{validate_endpoint, UrlValidationError};

pub const DEFAULT_FEED_URL: &str = "https://b.hatena.ne.jp/hotentry/it.rss";
pub const DEFAULT_CHANNEL: &str = "#general";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A required setting is absent from both file and environment.
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("Invalid URL for {key}: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: UrlValidationError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Every recognized option for a run.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
///
/// SEC-015: Custom Debug impl masks the Gemini key, bot token, and webhook URL
/// (the webhook URL is itself a credential).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed to read articles from.
    pub feed_url: String,

    /// Gemini API key. Required.
    pub gemini_api_key: Option<String>,

    /// Gemini model used for summaries.
    pub gemini_model: String,

    /// Gemini API base URL.
    pub gemini_base_url: String,

    /// Language every summary is written in.
    pub summary_language: String,

    /// Incoming webhook URL. Selects webhook mode when no bot token is set.
    pub slack_webhook_url: Option<String>,

    /// Bot token (`xoxb-...`). Selects bot mode; wins over the webhook URL.
    pub slack_bot_token: Option<String>,

    /// Channel posted to in bot mode.
    pub slack_channel: String,

    /// Slack Web API base URL.
    pub slack_api_base_url: String,

    /// Message shape in bot mode. Webhook mode always posts plain text.
    pub message_style: MessageStyle,

    /// Safety threshold (characters) for each article's composed text.
    pub block_text_limit: usize,

    /// Timeout applied to each remote call, in seconds.
    pub request_timeout_secs: u64,

    /// Log incremental payload sizes before publishing.
    pub diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_base_url: DEFAULT_BASE_URL.to_string(),
            summary_language: "Japanese".to_string(),
            slack_webhook_url: None,
            slack_bot_token: None,
            slack_channel: DEFAULT_CHANNEL.to_string(),
            slack_api_base_url: DEFAULT_API_BASE_URL.to_string(),
            message_style: MessageStyle::Interactive,
            block_text_limit: DEFAULT_TEXT_LIMIT,
            request_timeout_secs: 30,
            diagnostics: false,
        }
    }
}

/// Blank values count as unset, wherever they came from.
fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn redact(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[REDACTED]")
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("feed_url", &self.feed_url)
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("summary_language", &self.summary_language)
            .field("slack_webhook_url", &redact(&self.slack_webhook_url))
            .field("slack_bot_token", &redact(&self.slack_bot_token))
            .field("slack_channel", &self.slack_channel)
            .field("slack_api_base_url", &self.slack_api_base_url)
            .field("message_style", &self.message_style)
            .field("block_text_limit", &self.block_text_limit)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

/// How the digest reaches Slack, resolved from the credentials present.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    Webhook,
    Bot,
}

const KNOWN_KEYS: [&str; 13] = [
    "feed_url",
    "gemini_api_key",
    "gemini_model",
    "gemini_base_url",
    "summary_language",
    "slack_webhook_url",
    "slack_bot_token",
    "slack_channel",
    "slack_api_base_url",
    "message_style",
    "block_text_limit",
    "request_timeout_secs",
    "diagnostics",
];

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let mut config: Config = toml::from_str(&content)?;
        for secret in [
            &mut config.gemini_api_key,
            &mut config.slack_webhook_url,
            &mut config.slack_bot_token,
        ] {
            if !is_set(secret) {
                *secret = None;
            }
        }
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Overlays environment variables from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlays values supplied by `lookup`, keyed by environment variable name.
    ///
    /// Empty values count as unset.
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TECH_DIGEST_FEED_URL") {
            self.feed_url = v;
        }
        if let Some(v) = get("GEMINI_API_KEY") {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.gemini_model = v;
        }
        if let Some(v) = get("GEMINI_BASE_URL") {
            self.gemini_base_url = v;
        }
        if let Some(v) = get("TECH_DIGEST_SUMMARY_LANGUAGE") {
            self.summary_language = v;
        }
        if let Some(v) = get("SLACK_WEBHOOK_URL") {
            self.slack_webhook_url = Some(v);
        }
        if let Some(v) = get("SLACK_BOT_TOKEN") {
            self.slack_bot_token = Some(v);
        }
        if let Some(v) = get("SLACK_CHANNEL") {
            self.slack_channel = v;
        }
        if let Some(v) = get("SLACK_API_BASE_URL") {
            self.slack_api_base_url = v;
        }
        if let Some(v) = get("TECH_DIGEST_MESSAGE_STYLE") {
            self.message_style = v.parse().map_err(|message| ConfigError::InvalidValue {
                key: "TECH_DIGEST_MESSAGE_STYLE",
                message,
            })?;
        }
        if let Some(v) = get("TECH_DIGEST_BLOCK_TEXT_LIMIT") {
            self.block_text_limit =
                v.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: "TECH_DIGEST_BLOCK_TEXT_LIMIT",
                        message: e.to_string(),
                    })?;
        }
        if let Some(v) = get("TECH_DIGEST_TIMEOUT_SECS") {
            self.request_timeout_secs =
                v.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        key: "TECH_DIGEST_TIMEOUT_SECS",
                        message: e.to_string(),
                    })?;
        }
        if let Some(v) = get("TECH_DIGEST_DIAGNOSTICS") {
            self.diagnostics = parse_flag(&v).ok_or_else(|| ConfigError::InvalidValue {
                key: "TECH_DIGEST_DIAGNOSTICS",
                message: format!("expected true/false, got '{v}'"),
            })?;
        }

        Ok(self)
    }

    /// Validates everything a run needs before any network call.
    ///
    /// With `require_delivery` false (dry runs) no Slack credential is needed.
    /// Reports the first problem found.
    pub fn check(&self, require_delivery: bool) -> Result<(), ConfigError> {
        if !is_set(&self.gemini_api_key) {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }
        if require_delivery {
            match self.delivery_mode() {
                None => return Err(ConfigError::Missing("SLACK_BOT_TOKEN or SLACK_WEBHOOK_URL")),
                Some(DeliveryMode::Bot) if self.slack_channel.trim().is_empty() => {
                    return Err(ConfigError::Missing("SLACK_CHANNEL"));
                }
                Some(DeliveryMode::Webhook) => {
                    let url = self.slack_webhook_url.as_deref().unwrap_or_default();
                    validate_endpoint(url).map_err(|source| ConfigError::InvalidUrl {
                        key: "SLACK_WEBHOOK_URL",
                        source,
                    })?;
                }
                Some(DeliveryMode::Bot) => {
                    validate_endpoint(&self.slack_api_base_url).map_err(|source| {
                        ConfigError::InvalidUrl {
                            key: "SLACK_API_BASE_URL",
                            source,
                        }
                    })?;
                }
            }
        }

        validate_endpoint(&self.feed_url).map_err(|source| ConfigError::InvalidUrl {
            key: "TECH_DIGEST_FEED_URL",
            source,
        })?;
        validate_endpoint(&self.gemini_base_url).map_err(|source| ConfigError::InvalidUrl {
            key: "GEMINI_BASE_URL",
            source,
        })?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        if self.block_text_limit < 100 {
            return Err(ConfigError::InvalidValue {
                key: "block_text_limit",
                message: format!("{} is too small (minimum 100)", self.block_text_limit),
            });
        }

        Ok(())
    }

    /// Bot mode when a token is present, else webhook mode when a URL is present.
    pub fn delivery_mode(&self) -> Option<DeliveryMode> {
        if is_set(&self.slack_bot_token) {
            Some(DeliveryMode::Bot)
        } else if is_set(&self.slack_webhook_url) {
            Some(DeliveryMode::Webhook)
        } else {
            None
        }
    }

    /// The style actually rendered: webhooks cannot carry buttons.
    pub fn effective_style(&self) -> MessageStyle {
        match self.delivery_mode() {
            Some(DeliveryMode::Webhook) => MessageStyle::Plain,
            _ => self.message_style,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
