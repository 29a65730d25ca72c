//! Public and internal types for the notemeter API and pipeline.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::utils::config::{DEFAULT_METRICS_PORT, PackagePaths, ROTATE_THRESHOLD_BYTES};

/// Size and count statistics for one document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicStats {
    /// Whitespace-separated words in the whole file, preamble included.
    pub word_count: u64,
    /// Number of `\n`-separated segments (a trailing newline adds an empty last line).
    pub line_count: u64,
    /// File size in bytes, from filesystem metadata.
    pub file_size: u64,
    /// Decoded character count.
    pub char_count: u64,
}

/// Creation and last-modification instants from filesystem metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamps {
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Tags of one document, kept per source.
///
/// Each source is de-duplicated on its own and keeps first-seen order. The two sources are
/// not de-duplicated against each other: [`Tags::joined`] lists front-matter tags then inline
/// tags, so a tag present in both appears twice in the joined string. [`Tags::unique`] is the
/// set view used by the aggregate counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tags {
    front_matter: Vec<String>,
    inline: Vec<String>,
}

impl Tags {
    pub fn push_front_matter(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.front_matter, tag.into());
    }

    pub fn push_inline(&mut self, tag: impl Into<String>) {
        push_unique(&mut self.inline, tag.into());
    }

    pub fn front_matter(&self) -> &[String] {
        &self.front_matter
    }

    pub fn inline(&self) -> &[String] {
        &self.inline
    }

    pub fn is_empty(&self) -> bool {
        self.front_matter.is_empty() && self.inline.is_empty()
    }

    /// True if either source carries `tag`.
    pub fn contains(&self, tag: &str) -> bool {
        self.front_matter.iter().chain(&self.inline).any(|t| t == tag)
    }

    /// Distinct tags across both sources.
    pub fn unique(&self) -> BTreeSet<&str> {
        self.front_matter
            .iter()
            .chain(&self.inline)
            .map(String::as_str)
            .collect()
    }

    /// Comma-joined front-matter tags followed by inline tags.
    pub fn joined(&self) -> String {
        self.front_matter
            .iter()
            .chain(&self.inline)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn push_unique(list: &mut Vec<String>, tag: String) {
    if !tag.is_empty() && !list.contains(&tag) {
        list.push(tag);
    }
}

/// Normalized metadata for one document in one scan pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentRecord {
    /// File stem, e.g. `Daily Note` for `journal/Daily Note.md`.
    pub note_name: String,
    /// Path relative to the vault root, `/`-separated.
    pub file_path: String,
    pub stats: BasicStats,
    /// Front-matter fields, string-normalized. Nested mappings are dropped.
    pub fields: BTreeMap<String, String>,
    pub tags: Tags,
    /// Double-bracket link targets in encounter order, duplicates kept.
    pub links: Vec<String>,
    pub timestamps: Timestamps,
}

/// Counts returned by one scan pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Note files found under the root (hidden and excluded paths are never discovered).
    pub discovered: usize,
    /// Files extracted and folded into the counters.
    pub processed: usize,
    /// Files extracted but not newer than the watermark.
    pub skipped_by_watermark: usize,
    /// Files that could not be read, decoded or stat'ed.
    pub failed: usize,
    /// Durable records appended to the output file (0 in metrics-only mode).
    pub emitted: usize,
    /// Archive path when the output file was rotated after this pass.
    pub rotated_to: Option<PathBuf>,
}

/// Options for one scan pass. Use [`Settings`] for the full process configuration.
#[derive(Clone, Debug)]
pub struct ScanOptions {
    /// Exclude patterns (glob syntax, e.g. `templates`, `*.excalidraw.md`).
    pub exclude: Vec<String>,
    /// Show a progress counter while files are extracted.
    pub progress: bool,
    /// Override extraction worker count. When None, derived from available threads.
    pub num_threads: Option<usize>,
    /// Rotate the output file once it exceeds this many bytes after an append.
    pub rotate_threshold_bytes: u64,
    /// Set to stop the pass before its write phase (e.g. from a Ctrl+C handler).
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            progress: false,
            num_threads: None,
            rotate_threshold_bytes: ROTATE_THRESHOLD_BYTES,
            cancel: None,
        }
    }
}

/// Full process configuration (defaults, then config file, then CLI flags).
#[derive(Clone, Debug)]
pub struct Settings {
    /// Vault root to scan. Required.
    pub vault_path: Option<PathBuf>,
    /// Durable record destination.
    pub output_file: PathBuf,
    /// Log level name (`info`, `DEBUG`, ...).
    pub log_level: String,
    /// Port for the metrics endpoint.
    pub metrics_port: u16,
    /// Run the metrics-only pipeline and serve counters until interrupted.
    pub start_metrics_server: bool,
    /// Exclude patterns (glob syntax).
    pub exclude: Vec<String>,
    /// Show a progress counter during scans.
    pub progress: bool,
    /// Metrics mode only: rescan every this many seconds. None scans once.
    pub scan_interval_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_path: None,
            output_file: PackagePaths::get().default_output_path(),
            log_level: "info".to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
            start_metrics_server: false,
            exclude: Vec::new(),
            progress: false,
            scan_interval_secs: None,
        }
    }
}

impl From<&Settings> for ScanOptions {
    fn from(s: &Settings) -> Self {
        ScanOptions {
            exclude: s.exclude.clone(),
            progress: s.progress,
            ..ScanOptions::default()
        }
    }
}
