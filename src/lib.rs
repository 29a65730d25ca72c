//! Notemeter: Obsidian vault scanner emitting per-note log records and aggregate metrics

pub mod engine;
pub mod pipeline;
pub mod scan;
pub mod server;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::counters::AggregateCounters;
pub use scan::{scan_vault, scan_vault_metrics_only, vault_name};
pub use server::MetricsServer;

/// Result alias used by public notemeter API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;
