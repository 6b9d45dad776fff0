//! Process-wide cache of compiled keyword rules.
//!
//! Rules are rebuilt only on an explicit reload. A failed reload leaves the
//! previously compiled rules in place.

use std::path::Path;
use std::sync::{Arc, OnceLock, RwLock};

use crate::error::{AppError, Result};
use crate::models::CompiledRules;

use super::compile;

static GLOBAL: OnceLock<KeywordStore> = OnceLock::new();

/// Holder of the last successfully compiled rules.
#[derive(Debug, Default)]
pub struct KeywordStore {
    current: RwLock<Option<Arc<CompiledRules>>>,
}

impl KeywordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared store used by scheduled and on-demand runs.
    pub fn global() -> &'static KeywordStore {
        GLOBAL.get_or_init(KeywordStore::new)
    }

    /// Rules from the last successful compile, if any.
    pub fn current(&self) -> Option<Arc<CompiledRules>> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Compile `text` and, on success, make it the current rule set.
    pub fn reload_from_str(&self, text: &str) -> Result<Arc<CompiledRules>> {
        let compiled = match compile(text) {
            Ok(compiled) => Arc::new(compiled),
            Err(e) => {
                if self.current().is_some() {
                    log::error!("Keyword reload failed, keeping previous rules: {}", e);
                } else {
                    log::error!("Keyword compile failed: {}", e);
                }
                return Err(e);
            }
        };

        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&compiled));
        log::info!(
            "Loaded {} keyword group(s), {} global filter term(s)",
            compiled.rules.len(),
            compiled.global_filter.terms.len()
        );
        Ok(compiled)
    }

    /// Read and compile a keyword file.
    pub async fn reload_from_file(&self, path: impl AsRef<Path>) -> Result<Arc<CompiledRules>> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            AppError::config(format!("Cannot read keyword file {}: {}", path.display(), e))
        })?;
        self.reload_from_str(&text)
    }

    /// Current rules, compiling `path` first when nothing is loaded yet.
    pub async fn get_or_load(&self, path: impl AsRef<Path>) -> Result<Arc<CompiledRules>> {
        match self.current() {
            Some(rules) => Ok(rules),
            None => self.reload_from_file(path).await,
        }
    }
}
