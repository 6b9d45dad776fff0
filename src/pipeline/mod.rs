//! Pipeline stages of a report run.
//!
//! - `classify`: group items by keyword rules
//! - `render`: build the channel-agnostic report
//! - `markup` / `split`: per-channel text and size limits
//! - `dispatch`: concurrent delivery to every configured channel
//! - `run_report`: one end-to-end run

pub mod classify;
pub mod dispatch;
pub mod markup;
pub mod render;
pub mod run;
pub mod split;

pub use classify::classify;
pub use dispatch::{AccountOutcome, ChannelReport, DispatchResult, DispatchSettings, Dispatcher};
pub use render::render;
pub use run::{RunSummary, run_report};
