// src/pipeline/run.rs

//! One end-to-end report run.

use chrono::{DateTime, FixedOffset};

use super::dispatch::{DispatchResult, Dispatcher};
use super::{classify, render};
use crate::error::Result;
use crate::models::{ChannelConfig, CompiledRules, MatchStats, ReportType, RunStats};
use crate::sources::{ImportanceScorer, NewsFetcher};

/// What a run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_stats: RunStats,
    pub match_stats: MatchStats,
    pub dispatch: DispatchResult,
}

/// Fetch, score, classify, render and dispatch.
///
/// Only a fetch failure aborts the run. A scorer failure leaves items
/// unrated, and channel failures are reported in `dispatch`.
pub async fn run_report(
    fetcher: &dyn NewsFetcher,
    scorer: Option<&dyn ImportanceScorer>,
    rules: &CompiledRules,
    dispatcher: &Dispatcher,
    channels: &ChannelConfig,
    report_type: ReportType,
    now: DateTime<FixedOffset>,
) -> Result<RunSummary> {
    let mut outcome = fetcher.fetch().await?;
    log::info!(
        "Fetched {} item(s), {} platform(s) failed",
        outcome.items.len(),
        outcome.failed_ids.len()
    );

    if let Some(scorer) = scorer {
        if let Err(e) = scorer.score(&mut outcome.items).await {
            log::warn!("Importance scoring failed, items stay unrated: {}", e);
        }
    }

    let result = classify(&outcome.items, &rules.rules, &rules.global_filter);
    let run_stats = RunStats {
        generated_at: now,
        fetched: outcome.items.len(),
        failed_ids: outcome.failed_ids,
    };
    let payload = render(&result, report_type, &run_stats);
    let dispatch = dispatcher.dispatch_all(&payload, channels).await;

    let failed: Vec<String> = dispatch
        .as_map()
        .into_iter()
        .filter(|(_, ok)| !ok)
        .map(|(channel, _)| channel.to_string())
        .collect();
    if failed.is_empty() {
        log::info!("Run finished, {} matched item(s) delivered", result.stats.matched);
    } else {
        log::warn!("Run finished with failed channel(s): {}", failed.join(", "));
    }

    Ok(RunSummary {
        run_stats,
        match_stats: result.stats,
        dispatch,
    })
}
