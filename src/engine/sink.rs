//! Durable log records: label/payload construction, newline-delimited JSON append, size rotation.
//!
//! One line per record:
//! `{"timestamp": "<RFC 3339>", "labels": {...}, "line": "<JSON-encoded record>"}`.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::watermark::format_instant;
use crate::DocumentRecord;
use crate::utils::config::{LABEL_VALUE_MAX_LEN, PackagePaths, ROTATE_SUFFIX_FORMAT};

/// Prefix for front-matter keys in labels and payload.
const FIELD_PREFIX: &str = "frontmatter_";

/// One emitted unit: capture instant, low-cardinality labels, serialized record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub labels: BTreeMap<String, String>,
    pub line: String,
}

impl LogRecord {
    /// Build the log record for `record` in `vault`, captured at `captured_at`.
    pub fn new(record: &DocumentRecord, vault: &str, captured_at: DateTime<Utc>) -> Self {
        LogRecord {
            timestamp: format_instant(captured_at),
            labels: record_labels(record, vault),
            line: record_payload(record).to_string(),
        }
    }
}

/// `note_name`, `vault`, `job`, `tags` when present, and every front-matter field shorter than
/// [`LABEL_VALUE_MAX_LEN`].
pub fn record_labels(record: &DocumentRecord, vault: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("note_name".to_string(), record.note_name.clone());
    labels.insert("vault".to_string(), vault.to_string());
    labels.insert("job".to_string(), PackagePaths::get().job_name().to_string());
    if !record.tags.is_empty() {
        labels.insert("tags".to_string(), record.tags.joined());
    }
    for (key, value) in &record.fields {
        if value.chars().count() < LABEL_VALUE_MAX_LEN {
            labels.insert(format!("{FIELD_PREFIX}{key}"), value.clone());
        }
    }
    labels
}

/// Full record as a flat JSON object. Tag and link lists are comma-joined here and only here.
pub fn record_payload(record: &DocumentRecord) -> Value {
    let mut obj = Map::new();
    obj.insert("word_count".into(), json!(record.stats.word_count));
    obj.insert("line_count".into(), json!(record.stats.line_count));
    obj.insert("file_size".into(), json!(record.stats.file_size));
    obj.insert("char_count".into(), json!(record.stats.char_count));
    for (key, value) in &record.fields {
        obj.insert(format!("{FIELD_PREFIX}{key}"), json!(value));
    }
    if !record.tags.is_empty() {
        obj.insert("tags".into(), json!(record.tags.joined()));
    }
    if !record.tags.inline().is_empty() {
        obj.insert("inline_tags".into(), json!(record.tags.inline().join(",")));
    }
    if !record.links.is_empty() {
        obj.insert("wikilinks".into(), json!(record.links.join(",")));
    }
    obj.insert(
        "created_at".into(),
        json!(format_instant(record.timestamps.created_at)),
    );
    obj.insert(
        "modified_at".into(),
        json!(format_instant(record.timestamps.modified_at)),
    );
    obj.insert("file_path".into(), json!(record.file_path));
    obj.insert("note_name".into(), json!(record.note_name));
    Value::Object(obj)
}

/// Append `records` to `output`, one JSON object per line, creating the file (and its directory)
/// if needed. Returns the file size after the append.
pub fn append_records(output: &Path, records: &[LogRecord]) -> Result<u64> {
    if let Some(dir) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("create output directory {}", dir.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(output)
        .with_context(|| format!("open output file {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut writer, record)
            .with_context(|| format!("write record to {}", output.display()))?;
        writer
            .write_all(b"\n")
            .with_context(|| format!("write record to {}", output.display()))?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush output file {}", output.display()))?;
    file.sync_data()
        .with_context(|| format!("sync output file {}", output.display()))?;
    let size = file.metadata()?.len();
    debug!("Appended {} records to {} ({} bytes)", records.len(), output.display(), size);
    Ok(size)
}

/// Archive name for `output` rotated at `at`: `<output>.<YYYYMMDD_HHMMSS>`, with a numeric
/// suffix if that name is taken.
pub fn rotated_path(output: &Path, at: DateTime<Local>) -> PathBuf {
    let base = format!("{}.{}", output.display(), at.format(ROTATE_SUFFIX_FORMAT));
    let mut candidate = PathBuf::from(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = PathBuf::from(format!("{base}_{n}"));
        n += 1;
    }
    candidate
}

/// Rename `output` to its archive name when `size` exceeds `threshold`. Returns the archive path.
pub fn rotate_if_oversized(output: &Path, size: u64, threshold: u64) -> Result<Option<PathBuf>> {
    if size <= threshold {
        return Ok(None);
    }
    let archive = rotated_path(output, Local::now());
    fs::rename(output, &archive).with_context(|| {
        format!(
            "rotate output ({} -> {})",
            output.display(),
            archive.display()
        )
    })?;
    info!(
        "Rotated {} ({} bytes) to {}",
        output.display(),
        size,
        archive.display()
    );
    Ok(Some(archive))
}
