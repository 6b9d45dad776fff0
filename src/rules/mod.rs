//! Keyword rule compilation and caching.
//!
//! - `compile`: parse word-group grammar into `CompiledRules`
//! - `KeywordStore`: keep the last good compile, reload on request

mod compiler;
mod store;

pub use compiler::compile;
pub use store::KeywordStore;
