//! Classification output.

use serde::Serialize;

use super::news::{Category, Importance, NewsItem};

/// Items reported under one canonical keyword group.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupMatches {
    /// Group key
    pub key: String,

    /// Name shown in reports
    pub display_name: String,

    /// Visible items in first-seen order, at most `max_items`
    pub items: Vec<NewsItem>,

    /// Unique matches including those dropped by the cap
    pub total_count: usize,

    /// Cap applied to `items`
    pub max_items: Option<usize>,
}

impl GroupMatches {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Number of matches hidden by the cap.
    pub fn dropped(&self) -> usize {
        self.total_count - self.items.len()
    }
}

/// Per-level importance counts; `unrated` holds items without a score.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ImportanceCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unrated: usize,
}

impl ImportanceCounts {
    pub fn record(&mut self, importance: Option<Importance>) {
        match importance {
            Some(Importance::Critical) => self.critical += 1,
            Some(Importance::High) => self.high += 1,
            Some(Importance::Medium) => self.medium += 1,
            Some(Importance::Low) => self.low += 1,
            None => self.unrated += 1,
        }
    }
}

/// Aggregate counts over every unique matched item, capped or not.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct MatchStats {
    /// Unique items assigned to a group
    pub matched: usize,

    /// Matched items from forum platforms
    pub forum: usize,

    /// Matched items from news platforms
    pub news: usize,

    /// Matched items by importance level
    pub importance: ImportanceCounts,

    /// Items removed by the global filter
    pub globally_filtered: usize,

    /// Items no group matched
    pub unmatched: usize,

    /// Items dropped as a repeat of a story already in their group
    pub duplicates: usize,
}

impl MatchStats {
    pub fn record(&mut self, item: &NewsItem) {
        self.matched += 1;
        match item.category {
            Category::Forum => self.forum += 1,
            Category::News => self.news += 1,
        }
        self.importance.record(item.importance);
    }
}

/// Grouped, capped and de-duplicated classification of one batch.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ClassificationResult {
    /// Canonical groups in declaration order
    pub groups: Vec<GroupMatches>,

    pub stats: MatchStats,
}

impl ClassificationResult {
    /// Look up a group by key.
    pub fn get(&self, key: &str) -> Option<&GroupMatches> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Groups with at least one match.
    pub fn non_empty_groups(&self) -> impl Iterator<Item = &GroupMatches> {
        self.groups.iter().filter(|g| !g.is_empty())
    }

    /// Total visible items across groups.
    pub fn visible_count(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }
}
