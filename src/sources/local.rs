//! Fetcher backed by a local JSON snapshot.
//!
//! Used for development runs and tests. Layout:
//!
//! ```text
//! {
//!   "failed_ids": ["douyin"],
//!   "platforms": [
//!     { "id": "weibo", "name": "Weibo",
//!       "items": [ { "title": "...", "url": "...", "rank": 1 } ] }
//!   ]
//! }
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use super::{FetchOutcome, NewsFetcher};
use crate::error::{AppError, Result};
use crate::models::{Category, Importance, NewsItem, PlatformConfig};

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    failed_ids: Vec<String>,
    #[serde(default)]
    platforms: Vec<SnapshotPlatform>,
}

#[derive(Debug, Deserialize)]
struct SnapshotPlatform {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    items: Vec<SnapshotItem>,
}

#[derive(Debug, Deserialize)]
struct SnapshotItem {
    #[serde(default)]
    id: Option<String>,
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    category: Option<Category>,
    #[serde(default)]
    importance: Option<String>,
    #[serde(default)]
    last_seen_time: String,
}

/// Reads items from a JSON snapshot file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotFetcher {
    path: PathBuf,
    platforms: PlatformConfig,
}

impl JsonSnapshotFetcher {
    pub fn new(path: impl Into<PathBuf>, platforms: PlatformConfig) -> Self {
        Self {
            path: path.into(),
            platforms,
        }
    }

    fn convert(&self, snapshot: Snapshot) -> FetchOutcome {
        let mut items = Vec::new();
        for platform in snapshot.platforms {
            let name = platform.name.unwrap_or_else(|| platform.id.clone());
            let default_category = self.platforms.category_of(&platform.id);
            for (position, raw) in platform.items.into_iter().enumerate() {
                let title = raw.title.trim();
                if title.is_empty() {
                    continue;
                }
                let rank = raw.rank.unwrap_or(position as u32 + 1);
                let id = raw
                    .id
                    .unwrap_or_else(|| format!("{}-{}", platform.id, rank));
                let importance = raw.importance.as_deref().and_then(|label| {
                    let parsed = Importance::parse(label);
                    if parsed.is_none() {
                        log::debug!("Ignoring unknown importance `{}` on {}", label, id);
                    }
                    parsed
                });

                items.push(NewsItem {
                    id,
                    title: title.to_string(),
                    url: raw.url,
                    platform_id: platform.id.clone(),
                    platform_name: name.clone(),
                    category: raw.category.unwrap_or(default_category),
                    rank,
                    last_seen_time: raw.last_seen_time,
                    importance,
                });
            }
        }
        FetchOutcome {
            items,
            failed_ids: snapshot.failed_ids,
        }
    }
}

#[async_trait]
impl NewsFetcher for JsonSnapshotFetcher {
    async fn fetch(&self) -> Result<FetchOutcome> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            AppError::upstream(format!("cannot read snapshot {}: {}", self.path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        let outcome = self.convert(snapshot);
        log::info!(
            "Loaded {} item(s) from {} ({} failed platform(s))",
            outcome.items.len(),
            self.path.display(),
            outcome.failed_ids.len()
        );
        Ok(outcome)
    }
}
