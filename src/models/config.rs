//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::channel::{Channel, ChannelConfig};
use super::news::Category;
use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Delivery timing and size limits
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Keyword grammar source
    #[serde(default)]
    pub keywords: KeywordsConfig,

    /// Platform to category mapping
    #[serde(default)]
    pub platforms: PlatformConfig,

    /// Push destinations
    #[serde(default)]
    pub channels: ChannelConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secs) = lookup("DISPATCH_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            self.dispatch.timeout_secs = secs;
        }
        self.channels.apply_env(lookup);
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.user_agent.trim().is_empty() {
            return Err(AppError::validation("dispatch.user_agent is empty"));
        }
        if self.dispatch.timeout_secs == 0 {
            return Err(AppError::validation("dispatch.timeout_secs must be > 0"));
        }
        if self.dispatch.request_timeout_secs == 0 {
            return Err(AppError::validation(
                "dispatch.request_timeout_secs must be > 0",
            ));
        }
        if self.dispatch.max_accounts_per_channel == 0 {
            return Err(AppError::validation(
                "dispatch.max_accounts_per_channel must be > 0",
            ));
        }
        for channel in Channel::ALL {
            if let Some(limit) = self.dispatch.limits.get(channel) {
                if limit < defaults::MIN_BATCH_BYTES {
                    return Err(AppError::validation(format!(
                        "dispatch.limits.{channel} must be at least {} bytes",
                        defaults::MIN_BATCH_BYTES
                    )));
                }
            }
        }
        if self.keywords.path.trim().is_empty() {
            return Err(AppError::validation("keywords.path is empty"));
        }
        Ok(())
    }
}

/// Delivery behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// User-Agent header for webhook requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Deadline for a whole dispatch, in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::request_timeout")]
    pub request_timeout_secs: u64,

    /// Delay between split batches of one account
    #[serde(default = "defaults::batch_interval")]
    pub batch_interval_ms: u64,

    /// Delay between consecutive accounts of one channel
    #[serde(default = "defaults::account_interval")]
    pub account_interval_ms: u64,

    /// Accounts beyond this count are ignored
    #[serde(default = "defaults::max_accounts")]
    pub max_accounts_per_channel: usize,

    /// Telegram Bot API base URL
    #[serde(default = "defaults::telegram_api_base")]
    pub telegram_api_base: String,

    /// Per-channel payload size limits in bytes
    #[serde(default)]
    pub limits: BatchLimits,
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn batch_interval(&self) -> Duration {
        Duration::from_millis(self.batch_interval_ms)
    }

    pub fn account_interval(&self) -> Duration {
        Duration::from_millis(self.account_interval_ms)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_timeout_secs: defaults::request_timeout(),
            batch_interval_ms: defaults::batch_interval(),
            account_interval_ms: defaults::account_interval(),
            max_accounts_per_channel: defaults::max_accounts(),
            telegram_api_base: defaults::telegram_api_base(),
            limits: BatchLimits::default(),
        }
    }
}

/// Maximum bytes per request for each channel; `None` disables splitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchLimits {
    #[serde(default = "defaults::feishu_limit")]
    pub feishu: Option<usize>,
    #[serde(default = "defaults::dingtalk_limit")]
    pub dingtalk: Option<usize>,
    #[serde(default = "defaults::wework_limit")]
    pub wework: Option<usize>,
    #[serde(default = "defaults::telegram_limit")]
    pub telegram: Option<usize>,
    #[serde(default = "defaults::slack_limit")]
    pub slack: Option<usize>,
    #[serde(default = "defaults::bark_limit")]
    pub bark: Option<usize>,
    #[serde(default = "defaults::ntfy_limit")]
    pub ntfy: Option<usize>,
    #[serde(default = "defaults::webhook_limit")]
    pub webhook: Option<usize>,
    #[serde(default)]
    pub email: Option<usize>,
}

impl BatchLimits {
    pub fn get(&self, channel: Channel) -> Option<usize> {
        match channel {
            Channel::Feishu => self.feishu,
            Channel::Dingtalk => self.dingtalk,
            Channel::Wework => self.wework,
            Channel::Telegram => self.telegram,
            Channel::Slack => self.slack,
            Channel::Bark => self.bark,
            Channel::Ntfy => self.ntfy,
            Channel::Webhook => self.webhook,
            Channel::Email => self.email,
        }
    }
}

impl Default for BatchLimits {
    fn default() -> Self {
        Self {
            feishu: defaults::feishu_limit(),
            dingtalk: defaults::dingtalk_limit(),
            wework: defaults::wework_limit(),
            telegram: defaults::telegram_limit(),
            slack: defaults::slack_limit(),
            bark: defaults::bark_limit(),
            ntfy: defaults::ntfy_limit(),
            webhook: defaults::webhook_limit(),
            email: None,
        }
    }
}

/// Keyword grammar location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordsConfig {
    /// Path of the word-group file
    #[serde(default = "defaults::keywords_path")]
    pub path: String,
}

impl Default for KeywordsConfig {
    fn default() -> Self {
        Self {
            path: defaults::keywords_path(),
        }
    }
}

/// Which platforms count as forums and which as news outlets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "defaults::forums")]
    pub forums: Vec<String>,

    #[serde(default = "defaults::news")]
    pub news: Vec<String>,
}

impl PlatformConfig {
    /// Category of a platform; unknown platforms count as news.
    pub fn category_of(&self, platform_id: &str) -> Category {
        if self.forums.iter().any(|p| p == platform_id) {
            Category::Forum
        } else {
            Category::News
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            forums: defaults::forums(),
            news: defaults::news(),
        }
    }
}

mod defaults {
    pub const MIN_BATCH_BYTES: usize = 256;

    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; hotspot/0.1)".into()
    }
    pub fn timeout() -> u64 {
        120
    }
    pub fn request_timeout() -> u64 {
        30
    }
    pub fn batch_interval() -> u64 {
        3000
    }
    pub fn account_interval() -> u64 {
        1000
    }
    pub fn max_accounts() -> usize {
        3
    }
    pub fn telegram_api_base() -> String {
        "https://api.telegram.org".into()
    }

    // Batch size defaults
    pub fn feishu_limit() -> Option<usize> {
        Some(29_000)
    }
    pub fn dingtalk_limit() -> Option<usize> {
        Some(20_000)
    }
    pub fn wework_limit() -> Option<usize> {
        Some(4_000)
    }
    pub fn telegram_limit() -> Option<usize> {
        Some(4_000)
    }
    pub fn slack_limit() -> Option<usize> {
        Some(3_000)
    }
    pub fn bark_limit() -> Option<usize> {
        Some(3_600)
    }
    pub fn ntfy_limit() -> Option<usize> {
        Some(3_800)
    }
    pub fn webhook_limit() -> Option<usize> {
        Some(4_000)
    }

    pub fn keywords_path() -> String {
        "data/frequency_words.txt".into()
    }

    pub fn forums() -> Vec<String> {
        [
            "v2ex", "zhihu", "weibo", "hupu", "tieba", "douyin", "bilibili", "nowcoder", "juejin",
            "douban",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn news() -> Vec<String> {
        [
            "zaobao", "36kr", "toutiao", "ithome", "thepaper", "cls", "tencent", "sspai",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}
