//! News item data structure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform category a news item comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Forum,
    #[default]
    News,
}

/// Importance level assigned by an external scorer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Critical,
    High,
    Medium,
    Low,
}

impl Importance {
    /// Parse a scorer label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hot-topic item as delivered by the fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    /// Item identifier, unique within its platform
    pub id: String,

    /// Headline text
    pub title: String,

    /// Link to the item (empty when the platform gives none)
    #[serde(default)]
    pub url: String,

    /// Platform identifier (e.g. "weibo")
    pub platform_id: String,

    /// Platform display name
    pub platform_name: String,

    /// Forum or news platform
    #[serde(default)]
    pub category: Category,

    /// Position on the platform's hot list
    #[serde(default)]
    pub rank: u32,

    /// Last time the item was seen on the hot list
    #[serde(default)]
    pub last_seen_time: String,

    /// Scorer-assigned importance, `None` when unrated
    #[serde(default)]
    pub importance: Option<Importance>,
}

impl NewsItem {
    /// Create an item with the required fields; the rest take defaults.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        platform_id: impl Into<String>,
        platform_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: String::new(),
            platform_id: platform_id.into(),
            platform_name: platform_name.into(),
            category: Category::default(),
            rank: 0,
            last_seen_time: String::new(),
            importance: None,
        }
    }
}
