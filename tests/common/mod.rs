//! Shared test utilities for the hotspot integration harnesses.
//!
//! Import via `mod common; use common::*;` at the top of each harness file.

#![allow(dead_code)]

pub mod fake_webhook;

use chrono::{DateTime, FixedOffset};
use hotspot::models::{DispatchConfig, NewsItem, ReportPayload, ReportType, RunStats};
use hotspot::pipeline::{classify, render};
use hotspot::rules::compile;

pub use fake_webhook::{FakeWebhook, Recorded};

/// Fixed report time so payloads are reproducible.
pub fn fixed_now() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-01T08:30:00+08:00").unwrap()
}

/// Dispatch settings without pauses, suitable for tests.
pub fn fast_dispatch() -> DispatchConfig {
    DispatchConfig {
        timeout_secs: 10,
        request_timeout_secs: 5,
        batch_interval_ms: 0,
        account_interval_ms: 0,
        ..Default::default()
    }
}

/// `count` items all matching the keyword `AI`.
pub fn ai_items(count: usize) -> Vec<NewsItem> {
    (1..=count)
        .map(|i| {
            let mut item = NewsItem::new(
                i.to_string(),
                format!("AI headline number {i} with some extra words"),
                "weibo",
                "Weibo",
            );
            item.rank = i as u32;
            item.url = format!("https://news.example.com/{i}");
            item
        })
        .collect()
}

/// Classify `items` against `grammar` and render a daily report.
pub fn payload_for(grammar: &str, items: &[NewsItem]) -> ReportPayload {
    let rules = compile(grammar).unwrap();
    let result = classify(items, &rules.rules, &rules.global_filter);
    render(
        &result,
        ReportType::Daily,
        &RunStats {
            generated_at: fixed_now(),
            fetched: items.len(),
            failed_ids: Vec::new(),
        },
    )
}
