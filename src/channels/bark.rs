// src/channels/bark.rs

//! Bark iOS push; each account is a device URL such as `https://api.day.app/<key>`.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChannelSender, HttpContext, expect_json_field, post_json, webhook_url};
use crate::error::Result;
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

const GROUP: &str = "hotspot";

#[derive(Debug, Clone)]
pub struct BarkSender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
}

impl BarkSender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>) -> Self {
        Self { ctx, max_bytes }
    }
}

fn message(payload: &ReportPayload, batch: &Batch) -> Value {
    let title = match batch.header() {
        Some(header) => format!("{} {}", payload.headline(), header),
        None => payload.headline(),
    };
    json!({
        "title": title,
        "body": batch.text,
        "group": GROUP,
    })
}

#[async_trait]
impl ChannelSender for BarkSender {
    fn channel(&self) -> Channel {
        Channel::Bark
    }

    fn markup(&self) -> Markup {
        Markup::Plain
    }

    fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    fn batch_interval(&self) -> std::time::Duration {
        self.ctx.batch_interval
    }

    async fn deliver(&self, payload: &ReportPayload, batch: &Batch, account: &Account) -> Result<()> {
        let url = webhook_url(Channel::Bark, account)?;
        let body = message(payload, batch);
        let reply = post_json(&self.ctx, Channel::Bark, account, url, &body).await?;
        expect_json_field(Channel::Bark, account, &reply, "code", &json!(200))
    }
}
