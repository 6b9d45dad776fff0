//! Push channels and their per-account credentials.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Known push destinations.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Feishu,
    Dingtalk,
    Wework,
    Telegram,
    Slack,
    Bark,
    Ntfy,
    Webhook,
    Email,
}

impl Channel {
    /// Every channel, in dispatch declaration order.
    pub const ALL: [Channel; 9] = [
        Channel::Feishu,
        Channel::Dingtalk,
        Channel::Wework,
        Channel::Telegram,
        Channel::Slack,
        Channel::Bark,
        Channel::Ntfy,
        Channel::Webhook,
        Channel::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Feishu => "feishu",
            Channel::Dingtalk => "dingtalk",
            Channel::Wework => "wework",
            Channel::Telegram => "telegram",
            Channel::Slack => "slack",
            Channel::Bark => "bark",
            Channel::Ntfy => "ntfy",
            Channel::Webhook => "webhook",
            Channel::Email => "email",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete destination within a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    /// Plain webhook URL (feishu, dingtalk, slack, bark, generic webhook)
    Webhook { url: String },
    Wework { url: String, msg_type: String },
    Telegram { bot_token: String, chat_id: String },
    Ntfy {
        server_url: String,
        topic: String,
        token: Option<String>,
    },
    Email {
        from: String,
        password: String,
        to: Vec<String>,
        smtp_server: Option<String>,
        smtp_port: Option<u16>,
    },
}

impl Account {
    /// Log-safe description that never includes secrets.
    pub fn label(&self) -> String {
        match self {
            Account::Webhook { url } | Account::Wework { url, .. } => host_of(url),
            Account::Telegram { chat_id, .. } => format!("chat {}", mask(chat_id)),
            Account::Ntfy {
                server_url, topic, ..
            } => format!("{}/{}", host_of(server_url), topic),
            Account::Email { to, .. } => format!("mail to {}", to.join(",")),
        }
    }
}

fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "<invalid url>".to_string())
}

fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Split a `;`-delimited multi-account value.
pub fn split_accounts(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Single webhook URL list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WebhookSettings {
    /// `;`-separated webhook URLs
    pub webhook_url: String,
}

/// WeCom (WeWork) group robot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WeworkSettings {
    pub webhook_url: String,

    /// "markdown" (default) or "text"
    pub msg_type: String,
}

/// Telegram bot; tokens and chat ids pair by position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BarkSettings {
    /// `;`-separated device URLs (`https://api.day.app/<key>`)
    pub url: String,
}

/// ntfy topics; tokens pair with topics by position.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NtfySettings {
    pub server_url: String,
    pub topic: String,
    pub token: String,
}

/// SMTP delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmailSettings {
    pub from: String,
    pub password: String,

    /// Comma-separated recipients
    pub to: String,

    /// Inferred from the sender domain when empty
    pub smtp_server: String,
    pub smtp_port: Option<u16>,
}

/// Per-channel destinations; an absent or blank channel is disabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChannelConfig {
    pub feishu: Option<WebhookSettings>,
    pub dingtalk: Option<WebhookSettings>,
    pub wework: Option<WeworkSettings>,
    pub telegram: Option<TelegramSettings>,
    pub slack: Option<WebhookSettings>,
    pub bark: Option<BarkSettings>,
    pub ntfy: Option<NtfySettings>,
    pub webhook: Option<WebhookSettings>,
    pub email: Option<EmailSettings>,
}

const DEFAULT_NTFY_SERVER: &str = "https://ntfy.sh";

impl ChannelConfig {
    /// Whether a channel has any destination configured.
    pub fn is_configured(&self, channel: Channel) -> bool {
        let webhook = |s: &Option<WebhookSettings>| {
            s.as_ref().is_some_and(|s| !blank(&s.webhook_url))
        };
        match channel {
            Channel::Feishu => webhook(&self.feishu),
            Channel::Dingtalk => webhook(&self.dingtalk),
            Channel::Slack => webhook(&self.slack),
            Channel::Webhook => webhook(&self.webhook),
            Channel::Wework => self.wework.as_ref().is_some_and(|s| !blank(&s.webhook_url)),
            Channel::Telegram => self
                .telegram
                .as_ref()
                .is_some_and(|s| !blank(&s.bot_token) || !blank(&s.chat_id)),
            Channel::Bark => self.bark.as_ref().is_some_and(|s| !blank(&s.url)),
            Channel::Ntfy => self.ntfy.as_ref().is_some_and(|s| !blank(&s.topic)),
            Channel::Email => self
                .email
                .as_ref()
                .is_some_and(|s| !blank(&s.from) || !blank(&s.to)),
        }
    }

    /// Configured channels in declaration order.
    pub fn configured(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.is_configured(*c))
            .collect()
    }

    /// Resolve the accounts of a channel, in declaration order.
    ///
    /// Paired lists that do not line up produce accounts with an empty
    /// partner; their senders reject them as malformed.
    pub fn accounts(&self, channel: Channel) -> Vec<Account> {
        if !self.is_configured(channel) {
            return Vec::new();
        }
        let webhooks = |s: &Option<WebhookSettings>| -> Vec<Account> {
            s.as_ref()
                .map(|s| {
                    split_accounts(&s.webhook_url)
                        .into_iter()
                        .map(|url| Account::Webhook { url })
                        .collect()
                })
                .unwrap_or_default()
        };
        match channel {
            Channel::Feishu => webhooks(&self.feishu),
            Channel::Dingtalk => webhooks(&self.dingtalk),
            Channel::Slack => webhooks(&self.slack),
            Channel::Webhook => webhooks(&self.webhook),
            Channel::Wework => self
                .wework
                .as_ref()
                .map(|s| {
                    let msg_type = if blank(&s.msg_type) {
                        "markdown".to_string()
                    } else {
                        s.msg_type.trim().to_lowercase()
                    };
                    split_accounts(&s.webhook_url)
                        .into_iter()
                        .map(|url| Account::Wework {
                            url,
                            msg_type: msg_type.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Channel::Telegram => self
                .telegram
                .as_ref()
                .map(|s| {
                    let tokens = split_accounts(&s.bot_token);
                    let chats = split_accounts(&s.chat_id);
                    (0..tokens.len().max(chats.len()))
                        .map(|i| Account::Telegram {
                            bot_token: tokens.get(i).cloned().unwrap_or_default(),
                            chat_id: chats.get(i).cloned().unwrap_or_default(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Channel::Bark => self
                .bark
                .as_ref()
                .map(|s| {
                    split_accounts(&s.url)
                        .into_iter()
                        .map(|url| Account::Webhook { url })
                        .collect()
                })
                .unwrap_or_default(),
            Channel::Ntfy => self
                .ntfy
                .as_ref()
                .map(|s| {
                    let server_url = if blank(&s.server_url) {
                        DEFAULT_NTFY_SERVER.to_string()
                    } else {
                        s.server_url.trim().trim_end_matches('/').to_string()
                    };
                    let tokens = split_accounts(&s.token);
                    split_accounts(&s.topic)
                        .into_iter()
                        .enumerate()
                        .map(|(i, topic)| Account::Ntfy {
                            server_url: server_url.clone(),
                            topic,
                            token: tokens.get(i).cloned(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            Channel::Email => self
                .email
                .as_ref()
                .map(|s| {
                    vec![Account::Email {
                        from: s.from.trim().to_string(),
                        password: s.password.clone(),
                        to: s
                            .to
                            .split(',')
                            .map(str::trim)
                            .filter(|r| !r.is_empty())
                            .map(str::to_string)
                            .collect(),
                        smtp_server: Some(s.smtp_server.trim().to_string())
                            .filter(|v| !v.is_empty()),
                        smtp_port: s.smtp_port,
                    }]
                })
                .unwrap_or_default(),
        }
    }

    /// Override file values with non-blank environment values.
    ///
    /// `lookup` is normally `|k| std::env::var(k).ok()`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !blank(v));

        if let Some(v) = get("FEISHU_WEBHOOK_URL") {
            self.feishu.get_or_insert_with(Default::default).webhook_url = v;
        }
        if let Some(v) = get("DINGTALK_WEBHOOK_URL") {
            self.dingtalk.get_or_insert_with(Default::default).webhook_url = v;
        }
        if let Some(v) = get("WEWORK_WEBHOOK_URL") {
            self.wework.get_or_insert_with(Default::default).webhook_url = v;
        }
        if let Some(v) = get("WEWORK_MSG_TYPE") {
            self.wework.get_or_insert_with(Default::default).msg_type = v;
        }
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.get_or_insert_with(Default::default).bot_token = v;
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram.get_or_insert_with(Default::default).chat_id = v;
        }
        if let Some(v) = get("SLACK_WEBHOOK_URL") {
            self.slack.get_or_insert_with(Default::default).webhook_url = v;
        }
        if let Some(v) = get("BARK_URL") {
            self.bark.get_or_insert_with(Default::default).url = v;
        }
        if let Some(v) = get("NTFY_SERVER_URL") {
            self.ntfy.get_or_insert_with(Default::default).server_url = v;
        }
        if let Some(v) = get("NTFY_TOPIC") {
            self.ntfy.get_or_insert_with(Default::default).topic = v;
        }
        if let Some(v) = get("NTFY_TOKEN") {
            self.ntfy.get_or_insert_with(Default::default).token = v;
        }
        if let Some(v) = get("WEBHOOK_URL") {
            self.webhook.get_or_insert_with(Default::default).webhook_url = v;
        }
        if let Some(v) = get("EMAIL_FROM") {
            self.email.get_or_insert_with(Default::default).from = v;
        }
        if let Some(v) = get("EMAIL_PASSWORD") {
            self.email.get_or_insert_with(Default::default).password = v;
        }
        if let Some(v) = get("EMAIL_TO") {
            self.email.get_or_insert_with(Default::default).to = v;
        }
        if let Some(v) = get("EMAIL_SMTP_SERVER") {
            self.email.get_or_insert_with(Default::default).smtp_server = v;
        }
        if let Some(port) = get("EMAIL_SMTP_PORT").and_then(|v| v.trim().parse().ok()) {
            self.email.get_or_insert_with(Default::default).smtp_port = Some(port);
        }
    }
}
