// src/lib.rs

//! Hotspot: keyword classification and multi-channel report dispatch.

pub mod channels;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod rules;
pub mod sources;
pub mod utils;
