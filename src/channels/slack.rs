// src/channels/slack.rs

//! Slack incoming webhook with a mrkdwn section block.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChannelSender, HttpContext, expect_success, post_json, webhook_url};
use crate::error::Result;
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

#[derive(Debug, Clone)]
pub struct SlackSender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
}

impl SlackSender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>) -> Self {
        Self { ctx, max_bytes }
    }
}

fn message(payload: &ReportPayload, batch: &Batch) -> Value {
    json!({
        "text": payload.headline(),
        "blocks": [
            {
                "type": "section",
                "text": { "type": "mrkdwn", "text": batch.labelled() }
            }
        ]
    })
}

#[async_trait]
impl ChannelSender for SlackSender {
    fn channel(&self) -> Channel {
        Channel::Slack
    }

    fn markup(&self) -> Markup {
        Markup::SlackMrkdwn
    }

    fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    fn batch_interval(&self) -> std::time::Duration {
        self.ctx.batch_interval
    }

    async fn deliver(&self, payload: &ReportPayload, batch: &Batch, account: &Account) -> Result<()> {
        let url = webhook_url(Channel::Slack, account)?;
        let body = message(payload, batch);
        let reply = post_json(&self.ctx, Channel::Slack, account, url, &body).await?;
        expect_success(Channel::Slack, account, &reply)
    }
}
