//! Dispatch through the real channel senders against a fake push service.

mod common;

use std::collections::HashMap;

use common::*;
use hotspot::models::{Channel, ChannelConfig};
use hotspot::pipeline::Dispatcher;

fn channels_from_env(pairs: &[(&str, String)]) -> ChannelConfig {
    let env: HashMap<&str, String> = pairs.iter().cloned().collect();
    let mut channels = ChannelConfig::default();
    channels.apply_env(|key| env.get(key).cloned());
    channels
}

#[tokio::test]
async fn test_second_webhook_account_failing_fails_channel() {
    let hook = FakeWebhook::start().await.unwrap();
    hook.reply("/u2", 500, "boom").await;

    let channels = channels_from_env(&[(
        "WEBHOOK_URL",
        format!("{};{}", hook.url("/u1"), hook.url("/u2")),
    )]);
    let dispatcher = Dispatcher::from_config(&fast_dispatch()).unwrap();
    let payload = payload_for("AI", &ai_items(3));

    let result = dispatcher.dispatch_all(&payload, &channels).await;

    assert_eq!(result.is_success(Channel::Webhook), Some(false));
    let failed = result.failed_accounts(Channel::Webhook);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].index, 1);
    assert!(failed[0].error.as_deref().unwrap().contains("500"));

    // Accounts go out in declaration order and u1 still got the report.
    let paths: Vec<String> = hook.requests().await.into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/u1", "/u2"]);
    let body = hook.requests_to("/u1").await[0].json();
    assert!(body["content"].as_str().unwrap().contains("AI headline number 1"));
}

#[tokio::test]
async fn test_oversized_payload_is_split_into_batches() {
    let hook = FakeWebhook::start().await.unwrap();
    let channels = channels_from_env(&[("SLACK_WEBHOOK_URL", hook.url("/slack"))]);

    let mut config = fast_dispatch();
    config.limits.slack = Some(600);
    let dispatcher = Dispatcher::from_config(&config).unwrap();
    let payload = payload_for("AI", &ai_items(30));

    let result = dispatcher.dispatch_all(&payload, &channels).await;
    assert_eq!(result.is_success(Channel::Slack), Some(true));

    let requests = hook.requests_to("/slack").await;
    assert!(requests.len() > 1);
    assert_eq!(
        result.channels[&Channel::Slack].accounts[0].batches_sent,
        requests.len()
    );
    for (i, request) in requests.iter().enumerate() {
        let text = request.json()["blocks"][0]["text"]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(text.len() <= 600);
        assert!(text.starts_with(&format!("[{}/{}]", i + 1, requests.len())));
    }
}

#[tokio::test]
async fn test_one_failed_batch_fails_the_account() {
    let hook = FakeWebhook::start().await.unwrap();
    hook.reply_nth("/slack", 2, 500, "rate limited").await;
    let channels = channels_from_env(&[("SLACK_WEBHOOK_URL", hook.url("/slack"))]);

    let mut config = fast_dispatch();
    config.limits.slack = Some(600);
    let dispatcher = Dispatcher::from_config(&config).unwrap();
    let payload = payload_for("AI", &ai_items(30));

    let result = dispatcher.dispatch_all(&payload, &channels).await;
    assert_eq!(result.is_success(Channel::Slack), Some(false));
    // Sending stops at the failed batch.
    assert_eq!(hook.requests_to("/slack").await.len(), 2);
}

#[tokio::test]
async fn test_service_level_error_codes() {
    let hook = FakeWebhook::start().await.unwrap();
    hook.reply("/feishu", 200, r#"{"code":19001,"msg":"param invalid"}"#)
        .await;
    hook.reply("/dingtalk", 200, r#"{"errcode":0,"errmsg":"ok"}"#)
        .await;
    hook.reply("/bark", 200, r#"{"code":400,"message":"bad key"}"#)
        .await;

    let channels = channels_from_env(&[
        ("FEISHU_WEBHOOK_URL", hook.url("/feishu")),
        ("DINGTALK_WEBHOOK_URL", hook.url("/dingtalk")),
        ("BARK_URL", hook.url("/bark")),
        ("WEWORK_WEBHOOK_URL", hook.url("/wework")),
    ]);
    let dispatcher = Dispatcher::from_config(&fast_dispatch()).unwrap();
    let payload = payload_for("AI", &ai_items(2));

    let result = dispatcher.dispatch_all(&payload, &channels).await;
    assert_eq!(result.is_success(Channel::Feishu), Some(false));
    assert_eq!(result.is_success(Channel::Dingtalk), Some(true));
    assert_eq!(result.is_success(Channel::Bark), Some(false));
    assert_eq!(result.is_success(Channel::Wework), Some(true));
    assert_eq!(result.is_success(Channel::Slack), None);

    let feishu = hook.requests_to("/feishu").await[0].json();
    assert_eq!(feishu["msg_type"], "interactive");
    let wework = hook.requests_to("/wework").await[0].json();
    assert_eq!(wework["msgtype"], "markdown");
}

#[tokio::test]
async fn test_telegram_and_ntfy_requests() {
    let hook = FakeWebhook::start().await.unwrap();
    let channels = channels_from_env(&[
        ("TELEGRAM_BOT_TOKEN", "123:abc".to_string()),
        ("TELEGRAM_CHAT_ID", "-1001".to_string()),
        ("NTFY_SERVER_URL", hook.base_url()),
        ("NTFY_TOPIC", "hot".to_string()),
        ("NTFY_TOKEN", "tk_secret".to_string()),
    ]);

    let mut config = fast_dispatch();
    config.telegram_api_base = hook.base_url();
    let dispatcher = Dispatcher::from_config(&config).unwrap();
    let payload = payload_for("AI", &ai_items(2));

    let result = dispatcher.dispatch_all(&payload, &channels).await;
    assert!(result.all_succeeded(), "{result:?}");

    let telegram = hook.requests_to("/bot123:abc/sendMessage").await;
    assert_eq!(telegram.len(), 1);
    let body = telegram[0].json();
    assert_eq!(body["chat_id"], "-1001");
    assert_eq!(body["parse_mode"], "HTML");
    assert!(body["text"].as_str().unwrap().contains("<a href="));

    let ntfy = hook.requests_to("/hot").await;
    assert_eq!(ntfy.len(), 1);
    assert_eq!(
        ntfy[0].header("authorization").as_deref(),
        Some("Bearer tk_secret")
    );
    assert_eq!(ntfy[0].header("markdown").as_deref(), Some("yes"));
    assert!(ntfy[0].header("title").unwrap().starts_with("Hotspot daily summary"));
}

#[tokio::test]
async fn test_unreachable_channel_does_not_block_others() {
    let hook = FakeWebhook::start().await.unwrap();
    let channels = channels_from_env(&[
        // Nothing listens on port 9 of the loopback address.
        ("FEISHU_WEBHOOK_URL", "http://127.0.0.1:9/hook".to_string()),
        ("WEBHOOK_URL", hook.url("/ok")),
    ]);
    let dispatcher = Dispatcher::from_config(&fast_dispatch()).unwrap();
    let payload = payload_for("AI", &ai_items(1));

    let result = dispatcher.dispatch_all(&payload, &channels).await;
    assert_eq!(result.is_success(Channel::Feishu), Some(false));
    assert_eq!(result.is_success(Channel::Webhook), Some(true));
}

#[tokio::test]
async fn test_failed_accounts_do_not_expose_url_tokens() {
    let channels = channels_from_env(&[
        ("BARK_URL", "http://127.0.0.1:9/DEVICEKEY42".to_string()),
        (
            "DINGTALK_WEBHOOK_URL",
            "http://127.0.0.1:9/robot/send?access_token=ROBOTTOKEN42".to_string(),
        ),
    ]);
    let dispatcher = Dispatcher::from_config(&fast_dispatch()).unwrap();
    let payload = payload_for("AI", &ai_items(1));

    let result = dispatcher.dispatch_all(&payload, &channels).await;
    for channel in [Channel::Bark, Channel::Dingtalk] {
        let failed = result.failed_accounts(channel);
        assert_eq!(failed.len(), 1, "{channel}");
        let error = failed[0].error.as_deref().unwrap();
        assert!(!error.contains("DEVICEKEY42"), "{error}");
        assert!(!error.contains("ROBOTTOKEN42"), "{error}");
        assert!(!failed[0].label.contains("ROBOTTOKEN42"));
    }
}
