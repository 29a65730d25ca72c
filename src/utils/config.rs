//! Application configuration constants.
//! Names, thresholds and defaults in one place.

use std::path::PathBuf;
use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    watermark_filename: String,
    default_output_filename: String,
    default_config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| PackagePaths {
            pkg_name: env!("CARGO_PKG_NAME"),
            watermark_filename: ".last_run".to_string(),
            default_output_filename: "obsidian_logs.json".to_string(),
            default_config_filename: "config.yaml".to_string(),
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Value of the `job` label on every durable record.
    pub fn job_name(&self) -> &str {
        JOB_LABEL
    }

    /// Watermark file name, placed beside the output file.
    pub fn watermark_filename(&self) -> &str {
        &self.watermark_filename
    }

    pub fn default_config_filename(&self) -> &str {
        &self.default_config_filename
    }

    /// Default output destination: `<system temp dir>/obsidian_logs.json`.
    pub fn default_output_path(&self) -> PathBuf {
        std::env::temp_dir().join(&self.default_output_filename)
    }
}

// ---- Documents ----

/// Extension (without dot) of files treated as notes.
pub const NOTE_EXTENSION: &str = "md";

/// Marker that starts a hidden path segment; any such segment excludes the path.
pub const HIDDEN_SEGMENT_MARKER: char = '.';

/// `job` label on durable records. Log queries select on this value, so it stays fixed across renames.
pub const JOB_LABEL: &str = "obsidian-parser";

/// Structured fields whose string value is at least this long are kept in the payload but not emitted as labels.
pub const LABEL_VALUE_MAX_LEN: usize = 100;

// ---- Output ----

/// Output file is rotated once it grows past this size after an append (bytes). 50 MiB.
pub const ROTATE_THRESHOLD_BYTES: u64 = 50 * 1024 * 1024;

/// strftime pattern for the suffix of a rotated output file.
pub const ROTATE_SUFFIX_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---- Metrics ----

/// Default port for the metrics endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Path served by the metrics endpoint.
pub const METRICS_PATH: &str = "/metrics";

/// Prefix shared by every exposed metric name.
pub const METRIC_PREFIX: &str = "obsidian";

// ---- Worker threads ----

/// Thread limits for the extraction workers.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Minimum worker count.
    pub floor: usize,
    /// Maximum worker count. Extraction is read-bound; more workers than this only add contention.
    pub max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            max: Self::MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 1;
    pub const MAX_THREADS: usize = 8;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }

    /// Worker count: `requested` when given, else available threads clamped to `[floor, max]`.
    pub fn worker_count(&self, requested: Option<usize>) -> usize {
        match requested {
            Some(n) => n.max(self.floor),
            None => self.all_threads.clamp(self.floor, self.max.max(self.floor)),
        }
    }
}

// ---- Streaming channel cap ----

/// Capacity of the path and outcome channels. The walk blocks once this many paths are queued.
pub const STREAMING_CHANNEL_CAP: usize = 10_000;
