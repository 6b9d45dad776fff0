// src/channels/telegram.rs

//! Telegram Bot API, HTML parse mode.

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{ChannelSender, HttpContext, expect_json_field, post_json};
use crate::error::{AppError, Result};
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

#[derive(Debug, Clone)]
pub struct TelegramSender {
    ctx: HttpContext,
    max_bytes: Option<usize>,
    api_base: String,
}

impl TelegramSender {
    pub fn new(ctx: HttpContext, max_bytes: Option<usize>, api_base: &str) -> Self {
        Self {
            ctx,
            max_bytes,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, bot_token: &str) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, bot_token)
    }
}

fn message(chat_id: &str, batch: &Batch) -> Value {
    json!({
        "chat_id": chat_id,
        "text": batch.labelled(),
        "parse_mode": "HTML",
        "disable_web_page_preview": true,
    })
}

#[async_trait]
impl ChannelSender for TelegramSender {
    fn channel(&self) -> Channel {
        Channel::Telegram
    }

    fn markup(&self) -> Markup {
        Markup::TelegramHtml
    }

    fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    fn batch_interval(&self) -> std::time::Duration {
        self.ctx.batch_interval
    }

    async fn deliver(&self, _payload: &ReportPayload, batch: &Batch, account: &Account) -> Result<()> {
        let Account::Telegram { bot_token, chat_id } = account else {
            return Err(AppError::channel(
                Channel::Telegram,
                account.label(),
                "account type does not match channel",
            ));
        };
        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            return Err(AppError::channel(
                Channel::Telegram,
                account.label(),
                "bot token and chat id must both be set",
            ));
        }

        let url = self.endpoint(bot_token);
        let body = message(chat_id, batch);
        let reply = post_json(&self.ctx, Channel::Telegram, account, &url, &body).await?;
        expect_json_field(Channel::Telegram, account, &reply, "ok", &json!(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchConfig, ReportType};

    fn sender() -> TelegramSender {
        let config = DispatchConfig::default();
        TelegramSender::new(HttpContext::new(&config).unwrap(), Some(4000), "https://tg.test/")
    }

    #[test]
    fn test_endpoint_and_body() {
        assert_eq!(sender().endpoint("123:abc"), "https://tg.test/bot123:abc/sendMessage");
        let batch = Batch {
            index: 1,
            total: 2,
            text: "<b>AI</b>".into(),
        };
        let body = message("-100", &batch);
        assert_eq!(body["parse_mode"], "HTML");
        assert_eq!(body["text"], "[1/2]\n\n<b>AI</b>");
    }

    #[tokio::test]
    async fn test_unpaired_account_is_rejected_without_request() {
        let payload = ReportPayload {
            report_type: ReportType::Current,
            sections: Vec::new(),
            html: None,
            generated_at: chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
        };
        let batch = Batch {
            index: 1,
            total: 1,
            text: "x".into(),
        };
        let account = Account::Telegram {
            bot_token: "t2".into(),
            chat_id: String::new(),
        };
        let err = sender().deliver(&payload, &batch, &account).await.unwrap_err();
        assert!(matches!(err, AppError::Channel { channel: Channel::Telegram, .. }));
    }

    #[tokio::test]
    async fn test_transport_error_hides_bot_token() {
        let config = DispatchConfig::default();
        let unreachable =
            TelegramSender::new(HttpContext::new(&config).unwrap(), None, "http://127.0.0.1:1");
        let payload = ReportPayload {
            report_type: ReportType::Current,
            sections: Vec::new(),
            html: None,
            generated_at: chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap(),
        };
        let batch = Batch {
            index: 1,
            total: 1,
            text: "x".into(),
        };
        let account = Account::Telegram {
            bot_token: "123:SUPERSECRET".into(),
            chat_id: "-100".into(),
        };

        let err = unreachable
            .deliver(&payload, &batch, &account)
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("telegram"), "{err}");
        assert!(!err.contains("SUPERSECRET"), "{err}");
    }
}
