// src/channels/dingtalk.rs

//! DingTalk group robot, markdown messages.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChannelSender, HttpContext, expect_json_field, post_json, webhook_url};
use crate::error::Result;
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

#[derive(Debug, Clone)]
pub struct DingtalkSender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
}

impl DingtalkSender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>) -> Self {
        Self { ctx, max_bytes }
    }
}

fn message(payload: &ReportPayload, batch: &Batch) -> Value {
    json!({
        "msgtype": "markdown",
        "markdown": {
            "title": payload.headline(),
            "text": batch.labelled(),
        }
    })
}

#[async_trait]
impl ChannelSender for DingtalkSender {
    fn channel(&self) -> Channel {
        Channel::Dingtalk
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
        let url = webhook_url(Channel::Dingtalk, account)?;
        let body = message(payload, batch);
        let reply = post_json(&self.ctx, Channel::Dingtalk, account, url, &body).await?;
        expect_json_field(Channel::Dingtalk, account, &reply, "errcode", &json!(0))
    }
}
