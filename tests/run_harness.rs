//! End-to-end runs from files on disk to a fake push service.

mod common;

use std::fs;

use common::*;
use hotspot::config::{load_config_with, load_keywords};
use hotspot::models::{Channel, ReportType};
use hotspot::pipeline::{Dispatcher, run_report};
use hotspot::rules::KeywordStore;
use hotspot::sources::JsonSnapshotFetcher;

const KEYWORDS: &str = "\
[WORD_GROUPS]
+AI
!ban
@2

rust => Rust 语言

[GLOBAL_FILTER]
广告
";

const SNAPSHOT: &str = r#"{
    "failed_ids": ["douyin"],
    "platforms": [
        { "id": "weibo", "name": "微博", "items": [
            { "title": "AI产品上线", "url": "https://weibo.test/1" },
            { "title": "AI ban news" },
            { "title": "chatgpt新功能" },
            { "title": "AI突破" },
            { "title": "AI芯片" },
            { "title": "AI 广告 推广" }
        ]},
        { "id": "36kr", "name": "36氪", "items": [
            { "title": "Rust 2024 edition released", "url": "https://36kr.test/9" },
            { "title": "AI  产品上线!" }
        ]}
    ]
}"#;

#[tokio::test]
async fn test_run_from_files() {
    let hook = FakeWebhook::start().await.unwrap();
    let dir = tempfile::tempdir().unwrap();
    let keywords = dir.path().join("frequency_words.txt");
    let snapshot = dir.path().join("snapshot.json");
    let config_path = dir.path().join("config.toml");
    fs::write(&keywords, KEYWORDS).unwrap();
    fs::write(&snapshot, SNAPSHOT).unwrap();
    fs::write(
        &config_path,
        format!(
            "[dispatch]\nbatch_interval_ms = 0\naccount_interval_ms = 0\n\n[keywords]\npath = {:?}\n",
            keywords.display().to_string()
        ),
    )
    .unwrap();

    let webhook = hook.url("/report");
    let config = load_config_with(&config_path, |key| {
        (key == "WEBHOOK_URL").then(|| webhook.clone())
    })
    .unwrap();

    let store = KeywordStore::new();
    let rules = load_keywords(&config, &store).await.unwrap();
    let fetcher = JsonSnapshotFetcher::new(&snapshot, config.platforms.clone());
    let dispatcher = Dispatcher::from_config(&config.dispatch).unwrap();

    let summary = run_report(
        &fetcher,
        None,
        &rules,
        &dispatcher,
        &config.channels,
        ReportType::Daily,
        fixed_now(),
    )
    .await
    .unwrap();

    // AI group: 产品上线, 突破, 芯片 match; the 36kr repeat is a duplicate,
    // "AI ban news" is vetoed and the advert is filtered globally.
    assert_eq!(summary.match_stats.matched, 4);
    assert_eq!(summary.match_stats.duplicates, 1);
    assert_eq!(summary.match_stats.globally_filtered, 1);
    assert_eq!(summary.match_stats.unmatched, 2);
    assert_eq!(summary.run_stats.failed_ids, vec!["douyin"]);
    assert_eq!(summary.dispatch.is_success(Channel::Webhook), Some(true));

    let requests = hook.requests_to("/report").await;
    assert_eq!(requests.len(), 1);
    let content = requests[0].json()["content"].as_str().unwrap().to_string();
    assert!(content.contains("**📌 AI (3)**"));
    assert!(content.contains("1. [AI产品上线](https://weibo.test/1) (微博)"));
    assert!(content.contains("4. AI突破 (微博)"));
    assert!(!content.contains("AI芯片"));
    assert!(content.contains("**📌 Rust 语言 (1)**"));
    assert!(content.contains("Fetch failed: douyin"));
}

#[tokio::test]
async fn test_broken_keywords_stop_before_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let keywords = dir.path().join("words.txt");
    fs::write(&keywords, "AI\n/(unclosed/\n").unwrap();

    let mut config = hotspot::models::Config::default();
    config.keywords.path = keywords.display().to_string();

    let store = KeywordStore::new();
    let err = load_keywords(&config, &store).await.unwrap_err();
    assert!(err.to_string().contains("line 2"));
    assert!(store.current().is_none());
}

#[test]
fn test_sample_data_files_are_valid() {
    let config = hotspot::models::Config::load("data/config.toml").unwrap();
    config.validate().unwrap();

    let words = fs::read_to_string(&config.keywords.path).unwrap();
    let rules = hotspot::rules::compile(&words).unwrap();
    // The two `[huawei]` groups share one bucket.
    assert_eq!(rules.keywords().len(), 4);
    assert_eq!(rules.global_filter.terms, vec!["广告", "推广"]);
}
