// src/pipeline/dispatch.rs

//! Concurrent report dispatch.
//!
//! One task per configured channel. Accounts of a channel are served in
//! declaration order with a pause between them. The whole dispatch is
//! bounded by a deadline; channels still running at the deadline are
//! aborted and reported as failed. Account outcomes are streamed back as
//! they complete, so an interrupted channel still shows which accounts were
//! delivered and which one stalled.

use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::{self, JoinSet};
use tokio::time::Instant;

use crate::channels::{ChannelSender, SenderRegistry};
use crate::error::Result;
use crate::models::{Account, Channel, ChannelConfig, DispatchConfig, ReportPayload};

/// Outcome of one account.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AccountOutcome {
    /// Position in the channel's account list
    pub index: usize,

    /// Log-safe account description
    pub label: String,

    /// Requests delivered
    pub batches_sent: usize,

    /// Failure message, `None` on success
    pub error: Option<String>,
}

impl AccountOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of one channel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChannelReport {
    /// True only when every account succeeded
    pub success: bool,

    pub accounts: Vec<AccountOutcome>,

    /// Channel-level failure (no sender, timeout, panic)
    pub error: Option<String>,
}

impl ChannelReport {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            accounts: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Report for a channel whose worker stopped before finishing.
    ///
    /// Finished accounts keep their outcome. The account in flight carries
    /// `reason`; the ones after it are marked not attempted.
    fn interrupted(reason: String, mut accounts: Vec<AccountOutcome>, labels: &[String]) -> Self {
        let in_flight = accounts.len();
        for (index, label) in labels.iter().enumerate().skip(in_flight) {
            let error = if index == in_flight {
                reason.clone()
            } else {
                "not attempted".to_string()
            };
            accounts.push(AccountOutcome {
                index,
                label: label.clone(),
                batches_sent: 0,
                error: Some(error),
            });
        }
        Self {
            success: false,
            accounts,
            error: Some(reason),
        }
    }
}

/// Per-channel results of a dispatch; unconfigured channels are absent.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct DispatchResult {
    pub channels: BTreeMap<Channel, ChannelReport>,
}

impl DispatchResult {
    /// The `channel → success` view.
    pub fn as_map(&self) -> BTreeMap<Channel, bool> {
        self.channels
            .iter()
            .map(|(channel, report)| (*channel, report.success))
            .collect()
    }

    /// `None` when the channel was not attempted.
    pub fn is_success(&self, channel: Channel) -> Option<bool> {
        self.channels.get(&channel).map(|r| r.success)
    }

    /// Accounts of a channel that failed.
    pub fn failed_accounts(&self, channel: Channel) -> Vec<&AccountOutcome> {
        self.channels
            .get(&channel)
            .map(|r| r.accounts.iter().filter(|a| !a.succeeded()).collect())
            .unwrap_or_default()
    }

    pub fn all_succeeded(&self) -> bool {
        self.channels.values().all(|r| r.success)
    }
}

/// Timing and account limits for a dispatch.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Deadline for the whole dispatch
    pub timeout: Duration,

    /// Pause between consecutive accounts of one channel
    pub account_interval: Duration,

    /// Accounts beyond this are ignored
    pub max_accounts: usize,
}

impl From<&DispatchConfig> for DispatchSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            timeout: config.timeout(),
            account_interval: config.account_interval(),
            max_accounts: config.max_accounts_per_channel,
        }
    }
}

/// Fans a payload out to every configured channel.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: SenderRegistry,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(registry: SenderRegistry, settings: DispatchSettings) -> Self {
        Self { registry, settings }
    }

    /// Dispatcher with the built-in senders.
    pub fn from_config(config: &DispatchConfig) -> Result<Self> {
        Ok(Self::new(SenderRegistry::standard(config)?, config.into()))
    }

    pub fn registry(&self) -> &SenderRegistry {
        &self.registry
    }

    /// Send `payload` to every configured channel and account.
    ///
    /// Always returns; failures are reported in the result.
    pub async fn dispatch_all(
        &self,
        payload: &ReportPayload,
        channels: &ChannelConfig,
    ) -> DispatchResult {
        let payload = Arc::new(payload.clone());
        let mut result = DispatchResult::default();
        let mut workers = JoinSet::new();
        let mut tasks: HashMap<task::Id, Channel> = HashMap::new();
        let mut pending: BTreeMap<Channel, Vec<String>> = BTreeMap::new();
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

        log::info!(
            "Dispatching {} report {} ({} item(s))",
            payload.report_type,
            payload.fingerprint(),
            payload.item_count()
        );

        for channel in channels.configured() {
            let Some(sender) = self.registry.get(channel) else {
                log::warn!("No sender registered for {}", channel);
                result
                    .channels
                    .insert(channel, ChannelReport::failed("no sender registered"));
                continue;
            };

            let mut accounts = channels.accounts(channel);
            if accounts.len() > self.settings.max_accounts {
                log::warn!(
                    "{} has {} accounts, only the first {} are used",
                    channel,
                    accounts.len(),
                    self.settings.max_accounts
                );
                accounts.truncate(self.settings.max_accounts);
            }
            pending.insert(channel, accounts.iter().map(Account::label).collect());

            let payload = Arc::clone(&payload);
            let progress = progress_tx.clone();
            let interval = self.settings.account_interval;
            let handle = workers.spawn(async move {
                let run = AssertUnwindSafe(send_accounts(
                    sender, &payload, accounts, interval, progress,
                ));
                let report = run.catch_unwind().await.map_err(|_| {
                    log::error!("{} sender panicked", channel);
                    "sender panicked".to_string()
                });
                (channel, report)
            });
            tasks.insert(handle.id(), channel);
        }
        drop(progress_tx);

        let mut interrupted: HashMap<Channel, String> = HashMap::new();
        let deadline = Instant::now() + self.settings.timeout;
        loop {
            match tokio::time::timeout_at(deadline, workers.join_next()).await {
                Ok(Some(Ok((channel, Ok(report))))) => {
                    result.channels.insert(channel, report);
                }
                Ok(Some(Ok((channel, Err(reason))))) => {
                    interrupted.insert(channel, reason);
                }
                Ok(Some(Err(e))) => {
                    log::error!("Dispatch worker failed: {}", e);
                    if let Some(channel) = tasks.get(&e.id()) {
                        interrupted.insert(*channel, format!("worker failed: {e}"));
                    }
                }
                Ok(None) => break,
                Err(_) => {
                    log::warn!(
                        "Dispatch deadline of {:?} reached, aborting {} channel(s)",
                        self.settings.timeout,
                        workers.len()
                    );
                    workers.abort_all();
                    break;
                }
            }
        }

        let mut finished: HashMap<Channel, Vec<AccountOutcome>> = HashMap::new();
        while let Ok((channel, outcome)) = progress_rx.try_recv() {
            finished.entry(channel).or_default().push(outcome);
        }

        // Channels without a final report were interrupted or are still running.
        for (channel, labels) in pending {
            if result.channels.contains_key(&channel) {
                continue;
            }
            let reason = interrupted
                .remove(&channel)
                .unwrap_or_else(|| "timed out".to_string());
            let done = finished.remove(&channel).unwrap_or_default();
            result
                .channels
                .insert(channel, ChannelReport::interrupted(reason, done, &labels));
        }

        for (channel, report) in &result.channels {
            if report.success {
                log::info!("{} delivered to {} account(s)", channel, report.accounts.len());
            } else {
                log::warn!("{} failed", channel);
            }
        }
        result
    }
}

async fn send_accounts(
    sender: Arc<dyn ChannelSender>,
    payload: &ReportPayload,
    accounts: Vec<Account>,
    interval: Duration,
    progress: mpsc::UnboundedSender<(Channel, AccountOutcome)>,
) -> ChannelReport {
    let channel = sender.channel();
    let mut outcomes = Vec::with_capacity(accounts.len());

    for (index, account) in accounts.iter().enumerate() {
        if index > 0 && !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
        let label = account.label();
        let outcome = match sender.send(payload, account).await {
            Ok(batches_sent) => AccountOutcome {
                index,
                label,
                batches_sent,
                error: None,
            },
            Err(e) => {
                log::warn!("{} account #{} ({}): {}", channel, index + 1, label, e);
                AccountOutcome {
                    index,
                    label,
                    batches_sent: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        // The receiver is gone only once dispatch has already returned.
        let _ = progress.send((channel, outcome.clone()));
        outcomes.push(outcome);
    }

    let success = !outcomes.is_empty() && outcomes.iter().all(AccountOutcome::succeeded);
    ChannelReport {
        success,
        error: outcomes
            .is_empty()
            .then(|| "no usable accounts".to_string()),
        accounts: outcomes,
    }
}
