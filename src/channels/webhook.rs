// src/channels/webhook.rs

//! Generic JSON webhook.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChannelSender, HttpContext, expect_success, post_json, webhook_url};
use crate::error::Result;
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

#[derive(Debug, Clone)]
pub struct WebhookSender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
}

impl WebhookSender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>) -> Self {
        Self { ctx, max_bytes }
    }
}

fn message(payload: &ReportPayload, batch: &Batch) -> Value {
    json!({
        "title": payload.headline(),
        "report_type": payload.report_type,
        "generated_at": payload.generated_at.to_rfc3339(),
        "batch": { "index": batch.index, "total": batch.total },
        "content": batch.text,
    })
}

#[async_trait]
impl ChannelSender for WebhookSender {
    fn channel(&self) -> Channel {
        Channel::Webhook
    }

    fn markup(&self) -> Markup {
        Markup::Markdown
    }

    fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    fn batch_interval(&self) -> std::time::Duration {
        self.ctx.batch_interval
    }

    async fn deliver(&self, payload: &ReportPayload, batch: &Batch, account: &Account) -> Result<()> {
        let url = webhook_url(Channel::Webhook, account)?;
        let body = message(payload, batch);
        let reply = post_json(&self.ctx, Channel::Webhook, account, url, &body).await?;
        expect_success(Channel::Webhook, account, &reply)
    }
}
