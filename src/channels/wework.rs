// src/channels/wework.rs

//! WeCom group robot.
//!
//! Accounts choose `markdown` or `text` messages; text accounts get the
//! plain rendering.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChannelSender, HttpContext, expect_json_field, post_json, webhook_url};
use crate::error::Result;
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

#[derive(Debug, Clone)]
pub struct WeworkSender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
}

impl WeworkSender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>) -> Self {
        Self { ctx, max_bytes }
    }
}

fn is_text(account: &Account) -> bool {
    matches!(account, Account::Wework { msg_type, .. } if msg_type == "text")
}

fn message(batch: &Batch, text_mode: bool) -> Value {
    if text_mode {
        json!({ "msgtype": "text", "text": { "content": batch.labelled() } })
    } else {
        json!({ "msgtype": "markdown", "markdown": { "content": batch.labelled() } })
    }
}

#[async_trait]
impl ChannelSender for WeworkSender {
    fn channel(&self) -> Channel {
        Channel::Wework
    }

    fn markup(&self) -> Markup {
        Markup::Markdown
    }

    fn markup_for(&self, account: &Account) -> Markup {
        if is_text(account) {
            Markup::Plain
        } else {
            Markup::Markdown
        }
    }

    fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    fn batch_interval(&self) -> std::time::Duration {
        self.ctx.batch_interval
    }

    async fn deliver(&self, _payload: &ReportPayload, batch: &Batch, account: &Account) -> Result<()> {
        let url = webhook_url(Channel::Wework, account)?;
        let body = message(batch, is_text(account));
        let reply = post_json(&self.ctx, Channel::Wework, account, url, &body).await?;
        expect_json_field(Channel::Wework, account, &reply, "errcode", &json!(0))
    }
}
