//! Channel-agnostic report representation.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of report being pushed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// Everything matched today
    #[default]
    Daily,
    /// Only items new since the previous run
    Incremental,
    /// The current hot lists
    Current,
}

impl ReportType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "daily summary",
            Self::Incremental => "incremental",
            Self::Current => "current ranking",
        }
    }

    /// Summary text when no group matched anything.
    pub fn empty_message(&self) -> &'static str {
        match self {
            Self::Daily => "No matching hot topics",
            Self::Incremental => "No new matching hot topics since the last run",
            Self::Current => "No matching hot topics on the current lists",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Run-level facts rendered into the summary section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStats {
    /// Report generation time, shown verbatim
    pub generated_at: DateTime<FixedOffset>,

    /// Items received from the fetcher
    pub fetched: usize,

    /// Platforms that failed to fetch
    pub failed_ids: Vec<String>,
}

/// One rendered line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportLine {
    /// Free text (summary facts)
    Text { text: String },
    /// A news item: `rank. title (platform)`, linked to `url`
    Item {
        rank: u32,
        title: String,
        platform: String,
        url: Option<String>,
    },
}

/// A titled block of lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Section {
    pub title: String,

    /// Match volume behind the section, drives heat markers
    pub heat: Option<usize>,

    pub lines: Vec<ReportLine>,
}

/// Report handed to every channel sender.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportPayload {
    pub report_type: ReportType,

    /// Summary first, then one section per non-empty group
    pub sections: Vec<Section>,

    /// HTML document for email
    pub html: Option<String>,

    /// Generation time carried over from the run stats
    pub generated_at: DateTime<FixedOffset>,
}

impl ReportPayload {
    /// Subject/title line used by channels that show one.
    pub fn headline(&self) -> String {
        format!(
            "Hotspot {} {}",
            self.report_type.label(),
            self.generated_at.format("%Y-%m-%d %H:%M")
        )
    }

    /// Hex SHA-256 over the serialized payload.
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }

    /// Number of item lines across all sections.
    pub fn item_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.lines.iter())
            .filter(|l| matches!(l, ReportLine::Item { .. }))
            .count()
    }
}
