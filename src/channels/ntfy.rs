// src/channels/ntfy.rs

//! ntfy topic publishing.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};

use super::{ChannelSender, HttpContext, expect_success};
use crate::error::{AppError, Result};
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;
use crate::utils::http;

#[derive(Debug, Clone)]
pub struct NtfySender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
}

impl NtfySender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>) -> Self {
        Self { ctx, max_bytes }
    }
}

fn title(payload: &ReportPayload, batch: &Batch) -> String {
    match batch.header() {
        Some(header) => format!("{} {}", payload.headline(), header),
        None => payload.headline(),
    }
}

#[async_trait]
impl ChannelSender for NtfySender {
    fn channel(&self) -> Channel {
        Channel::Ntfy
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
        let Account::Ntfy {
            server_url,
            topic,
            token,
        } = account
        else {
            return Err(AppError::channel(
                Channel::Ntfy,
                account.label(),
                "account type does not match channel",
            ));
        };

        let endpoint = format!("{}/{}", server_url.trim_end_matches('/'), topic);
        let url = url::Url::parse(&endpoint).map_err(|e| {
            AppError::channel(Channel::Ntfy, account.label(), format!("invalid URL: {e}"))
        })?;

        let mut request = self
            .ctx
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .header("Title", title(payload, batch))
            .header("Markdown", "yes")
            .header("Tags", "newspaper")
            .body(batch.text.clone());
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let reply = http::send(request)
            .await
            .map_err(|e| AppError::channel(Channel::Ntfy, account.label(), e))?;
        expect_success(Channel::Ntfy, account, &reply)
    }
}
