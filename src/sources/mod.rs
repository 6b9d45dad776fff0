//! Collaborators that feed a run.
//!
//! Fetching platform data and scoring importance live outside this crate;
//! they plug in through these traits.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NewsItem;

pub use local::JsonSnapshotFetcher;

/// Items of one fetch round plus the platforms that could not be fetched.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub items: Vec<NewsItem>,
    pub failed_ids: Vec<String>,
}

/// Source of hot-list items.
#[async_trait]
pub trait NewsFetcher: Send + Sync {
    /// Fetch the current items; per-platform failures go into `failed_ids`.
    async fn fetch(&self) -> Result<FetchOutcome>;
}

/// Optional importance annotation before classification.
#[async_trait]
pub trait ImportanceScorer: Send + Sync {
    /// Set `importance` on the items it can rate; others stay unrated.
    async fn score(&self, items: &mut [NewsItem]) -> Result<()>;
}
