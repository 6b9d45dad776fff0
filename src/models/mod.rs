// src/models/mod.rs

//! Domain models for classification and dispatch.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod channel;
mod classification;
mod config;
mod news;
mod report;
mod rules;

// Re-export all public types
pub use channel::{
    Account, BarkSettings, Channel, ChannelConfig, EmailSettings, NtfySettings, TelegramSettings,
    WebhookSettings, WeworkSettings,
};
pub use classification::{ClassificationResult, GroupMatches, ImportanceCounts, MatchStats};
pub use config::{BatchLimits, Config, DispatchConfig, KeywordsConfig, PlatformConfig};
pub use news::{Category, Importance, NewsItem};
pub use report::{ReportLine, ReportPayload, ReportType, RunStats, Section};
pub use rules::{CompiledRules, GlobalFilter, KeywordRule, RuleSet};
