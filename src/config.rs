// src/config.rs

//! Configuration loading utilities.
//!
//! File values come first, environment variables override them, then the
//! result is validated.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{CompiledRules, Config};
use crate::rules::KeywordStore;

/// Load configuration from a TOML file with process environment overrides.
///
/// Falls back to defaults if the file cannot be read.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Like [`load_config`] with an explicit variable lookup.
pub fn load_config_with(
    path: impl AsRef<Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Config> {
    let mut config = Config::load_or_default(path);
    config.apply_env(lookup);
    config.validate()?;
    log::debug!("Configured channels: {:?}", config.channels.configured());
    Ok(config)
}

/// Load the configured keyword file into `store`, or reuse what it holds.
pub async fn load_keywords(config: &Config, store: &KeywordStore) -> Result<Arc<CompiledRules>> {
    store.get_or_load(&config.keywords.path).await
}
