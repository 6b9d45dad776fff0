//! Channel senders.
//!
//! One `ChannelSender` per push service, looked up through a `SenderRegistry`
//! built once at startup. A sender renders the payload in its channel's
//! markup, splits it to the channel's size limit and posts the batches in
//! order. Every failure comes back as `AppError::Channel`.

pub mod bark;
pub mod dingtalk;
pub mod email;
pub mod feishu;
pub mod ntfy;
pub mod slack;
pub mod telegram;
pub mod webhook;
pub mod wework;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{Account, Channel, DispatchConfig, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::{Batch, split};
use crate::utils::http::{self, Reply};

pub use bark::BarkSender;
pub use dingtalk::DingtalkSender;
pub use email::EmailSender;
pub use feishu::FeishuSender;
pub use ntfy::NtfySender;
pub use slack::SlackSender;
pub use telegram::TelegramSender;
pub use webhook::WebhookSender;
pub use wework::WeworkSender;

/// Delivery capability of one channel.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn channel(&self) -> Channel;

    /// Text style of the channel.
    fn markup(&self) -> Markup;

    /// Text style for a specific account; most channels use one style.
    fn markup_for(&self, _account: &Account) -> Markup {
        self.markup()
    }

    /// Request size limit in bytes, `None` for unlimited.
    fn max_bytes(&self) -> Option<usize>;

    /// Pause between split batches.
    fn batch_interval(&self) -> Duration {
        Duration::ZERO
    }

    /// Post one batch to one account.
    async fn deliver(&self, payload: &ReportPayload, batch: &Batch, account: &Account)
    -> Result<()>;

    /// Send a whole payload to one account; returns the number of requests made.
    ///
    /// Succeeds only when every batch was delivered.
    async fn send(&self, payload: &ReportPayload, account: &Account) -> Result<usize> {
        let blocks = self.markup_for(account).blocks(payload);
        let batches = split(&blocks, self.max_bytes());
        if batches.len() > 1 {
            log::info!(
                "{} payload for {} split into {} batches",
                self.channel(),
                account.label(),
                batches.len()
            );
        }

        for batch in &batches {
            if batch.index > 1 && !self.batch_interval().is_zero() {
                tokio::time::sleep(self.batch_interval()).await;
            }
            if let Err(e) = self.deliver(payload, batch, account).await {
                log::warn!(
                    "{} batch {}/{} to {} failed",
                    self.channel(),
                    batch.index,
                    batch.total,
                    account.label()
                );
                return Err(e);
            }
        }
        Ok(batches.len())
    }
}

/// HTTP state shared by the webhook-style senders.
#[derive(Debug, Clone)]
pub struct HttpContext {
    pub client: Client,
    pub batch_interval: Duration,
}

impl HttpContext {
    pub fn new(config: &DispatchConfig) -> Result<Self> {
        Ok(Self {
            client: http::create_async_client(config)?,
            batch_interval: config.batch_interval(),
        })
    }
}

/// Static channel → sender table.
#[derive(Clone, Default)]
pub struct SenderRegistry {
    senders: HashMap<Channel, Arc<dyn ChannelSender>>,
}

impl fmt::Debug for SenderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut channels: Vec<_> = self.senders.keys().collect();
        channels.sort();
        f.debug_struct("SenderRegistry")
            .field("channels", &channels)
            .finish()
    }
}

impl SenderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in sender of every known channel.
    pub fn standard(config: &DispatchConfig) -> Result<Self> {
        let ctx = HttpContext::new(config)?;
        let limits = &config.limits;
        let registry = Self::new()
            .with_sender(Arc::new(FeishuSender::new(
                ctx.clone(),
                limits.get(Channel::Feishu),
            )))
            .with_sender(Arc::new(DingtalkSender::new(
                ctx.clone(),
                limits.get(Channel::Dingtalk),
            )))
            .with_sender(Arc::new(WeworkSender::new(
                ctx.clone(),
                limits.get(Channel::Wework),
            )))
            .with_sender(Arc::new(TelegramSender::new(
                ctx.clone(),
                limits.get(Channel::Telegram),
                &config.telegram_api_base,
            )))
            .with_sender(Arc::new(SlackSender::new(
                ctx.clone(),
                limits.get(Channel::Slack),
            )))
            .with_sender(Arc::new(BarkSender::new(
                ctx.clone(),
                limits.get(Channel::Bark),
            )))
            .with_sender(Arc::new(NtfySender::new(
                ctx.clone(),
                limits.get(Channel::Ntfy),
            )))
            .with_sender(Arc::new(WebhookSender::new(
                ctx,
                limits.get(Channel::Webhook),
            )))
            .with_sender(Arc::new(EmailSender::new(
                config.request_timeout(),
                limits.get(Channel::Email),
            )));
        Ok(registry)
    }

    /// Register (or replace) the sender for its channel.
    pub fn with_sender(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(sender.channel(), sender);
        self
    }

    pub fn get(&self, channel: Channel) -> Option<Arc<dyn ChannelSender>> {
        self.senders.get(&channel).cloned()
    }

    pub fn channels(&self) -> Vec<Channel> {
        let mut channels: Vec<_> = self.senders.keys().copied().collect();
        channels.sort();
        channels
    }
}

/// URL of a plain webhook account, validated.
pub(crate) fn webhook_url(channel: Channel, account: &Account) -> Result<&str> {
    let url = match account {
        Account::Webhook { url } | Account::Wework { url, .. } => url.as_str(),
        other => {
            return Err(AppError::channel(
                channel,
                other.label(),
                "account type does not match channel",
            ));
        }
    };
    url::Url::parse(url)
        .map_err(|e| AppError::channel(channel, account.label(), format!("invalid URL: {e}")))?;
    Ok(url)
}

/// POST a JSON body and return the reply, mapping transport errors.
pub(crate) async fn post_json(
    ctx: &HttpContext,
    channel: Channel,
    account: &Account,
    url: &str,
    body: &Value,
) -> Result<Reply> {
    http::send(ctx.client.post(url).json(body))
        .await
        .map_err(|e| AppError::channel(channel, account.label(), e))
}

/// Fail unless the reply has a 2xx status.
pub(crate) fn expect_success(channel: Channel, account: &Account, reply: &Reply) -> Result<()> {
    if reply.status.is_success() {
        Ok(())
    } else {
        Err(AppError::channel(
            channel,
            account.label(),
            format!("HTTP {}: {}", reply.status, reply.excerpt()),
        ))
    }
}

/// Fail unless the reply is 2xx JSON whose `field` equals `expected`.
pub(crate) fn expect_json_field(
    channel: Channel,
    account: &Account,
    reply: &Reply,
    field: &str,
    expected: &Value,
) -> Result<()> {
    expect_success(channel, account, reply)?;
    let actual = reply.json().and_then(|body| body.get(field).cloned());
    match actual {
        Some(ref value) if value == expected => Ok(()),
        _ => Err(AppError::channel(
            channel,
            account.label(),
            format!("unexpected response: {}", reply.excerpt()),
        )),
    }
}
