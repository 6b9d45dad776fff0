// src/channels/feishu.rs

//! Feishu (Lark) custom bot, sent as an interactive card.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChannelSender, HttpContext, expect_json_field, post_json, webhook_url};
use crate::error::Result;
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

#[derive(Debug, Clone)]
pub struct FeishuSender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
}

impl FeishuSender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>) -> Self {
        Self { ctx, max_bytes }
    }
}

fn card(payload: &ReportPayload, batch: &Batch) -> Value {
    let mut title = payload.headline();
    if let Some(header) = batch.header() {
        title = format!("{title} {header}");
    }
    json!({
        "msg_type": "interactive",
        "card": {
            "config": { "wide_screen_mode": true },
            "header": {
                "template": "blue",
                "title": { "tag": "plain_text", "content": title }
            },
            "elements": [
                { "tag": "markdown", "content": batch.text }
            ]
        }
    })
}

#[async_trait]
impl ChannelSender for FeishuSender {
    fn channel(&self) -> Channel {
        Channel::Feishu
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
        let url = webhook_url(Channel::Feishu, account)?;
        let reply = post_json(&self.ctx, Channel::Feishu, account, url, &card(payload, batch)).await?;
        expect_json_field(Channel::Feishu, account, &reply, "code", &json!(0))
    }
}
