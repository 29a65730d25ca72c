//! Metadata extraction: one [`RawDocument`] plus its filesystem metadata → one [`DocumentRecord`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::Path;
use std::sync::OnceLock;

use super::reader::{Preamble, RawDocument};
use super::tools::path_to_record_string;
use crate::{BasicStats, DocumentRecord, Tags, Timestamps};

/// Front-matter key whose value feeds the tag set.
const TAGS_FIELD: &str = "tags";

static INLINE_TAG_RE: OnceLock<Regex> = OnceLock::new();
static WIKILINK_RE: OnceLock<Regex> = OnceLock::new();

/// `#` immediately followed by one or more word characters.
fn inline_tag_re() -> &'static Regex {
    INLINE_TAG_RE.get_or_init(|| Regex::new(r"#(\w+)").expect("inline tag pattern compiles"))
}

/// `[[target]]`, target without `]`.
fn wikilink_re() -> &'static Regex {
    WIKILINK_RE.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("wikilink pattern compiles"))
}

/// Build the record for one document. `rel_path` is relative to the vault root.
/// Fails only when timestamps cannot be read; front-matter problems degrade to empty fields.
pub fn extract_record(doc: &RawDocument, rel_path: &Path, meta: &Metadata) -> Result<DocumentRecord> {
    let file_path = path_to_record_string(rel_path);
    if let Preamble::Malformed(msg) = &doc.preamble {
        warn!("Malformed front matter in {}, treating as body: {}", file_path, msg);
    }
    let timestamps = file_timestamps(meta).with_context(|| format!("timestamps for {file_path}"))?;

    let empty = Mapping::new();
    let front_matter = doc.front_matter().unwrap_or(&empty);
    let body = doc.body();

    let mut tags = Tags::default();
    front_matter_tags(front_matter, &mut tags);
    for tag in inline_tags(body) {
        tags.push_inline(tag);
    }

    Ok(DocumentRecord {
        note_name: note_name(rel_path),
        file_path,
        stats: basic_stats(&doc.text, meta.len()),
        fields: normalize_fields(front_matter),
        tags,
        links: wikilinks(body),
        timestamps,
    })
}

/// File stem, lossily decoded.
pub fn note_name(rel_path: &Path) -> String {
    rel_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn basic_stats(text: &str, file_size: u64) -> BasicStats {
    BasicStats {
        word_count: text.split_whitespace().count() as u64,
        line_count: text.split('\n').count() as u64,
        file_size,
        char_count: text.chars().count() as u64,
    }
}

/// Stringify front-matter fields. Scalars as-is, sequences comma-joined item by item. Top-level
/// nested mappings and nulls are dropped.
pub fn normalize_fields(front_matter: &Mapping) -> BTreeMap<String, String> {
    front_matter
        .iter()
        .filter_map(|(k, v)| Some((scalar_to_string(k)?, normalize_value(v)?)))
        .collect()
}

fn normalize_value(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(items) => Some(
            items
                .iter()
                .map(list_item_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Tagged(tagged) => normalize_value(&tagged.value),
        other => scalar_to_string(other),
    }
}

/// Every list item keeps its slot: null becomes empty, nested values compact JSON.
fn list_item_to_string(item: &Value) -> String {
    match item {
        Value::Null => String::new(),
        Value::Sequence(_) | Value::Mapping(_) => serde_json::to_string(item).unwrap_or_default(),
        Value::Tagged(tagged) => list_item_to_string(&tagged.value),
        scalar => scalar_to_string(scalar).unwrap_or_default(),
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Read the `tags` front-matter field (sequence or scalar) into `tags`.
fn front_matter_tags(front_matter: &Mapping, tags: &mut Tags) {
    match front_matter.get(TAGS_FIELD) {
        Some(Value::Sequence(items)) => {
            for tag in items.iter().filter_map(scalar_to_string) {
                tags.push_front_matter(tag);
            }
        }
        Some(other) => {
            if let Some(tag) = scalar_to_string(other) {
                tags.push_front_matter(tag);
            }
        }
        None => {}
    }
}

/// Inline `#tag` names in encounter order, duplicates kept.
pub fn inline_tags(body: &str) -> Vec<&str> {
    inline_tag_re()
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

/// `[[link]]` targets in encounter order, duplicates kept.
pub fn wikilinks(body: &str) -> Vec<String> {
    wikilink_re()
        .captures_iter(body)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Creation and modification instants. Creation falls back to the inode change time, then to
/// the modification time, on filesystems that do not record a birth time.
pub fn file_timestamps(meta: &Metadata) -> Result<Timestamps> {
    let modified_at: DateTime<Utc> = meta.modified().context("read modification time")?.into();
    let created_at = meta
        .created()
        .ok()
        .map(DateTime::<Utc>::from)
        .or_else(|| status_change_time(meta))
        .unwrap_or(modified_at);
    Ok(Timestamps {
        created_at,
        modified_at,
    })
}

#[cfg(unix)]
fn status_change_time(meta: &Metadata) -> Option<DateTime<Utc>> {
    use std::os::unix::fs::MetadataExt;
    DateTime::<Utc>::from_timestamp(meta.ctime(), u32::try_from(meta.ctime_nsec()).ok()?)
}

#[cfg(not(unix))]
fn status_change_time(_meta: &Metadata) -> Option<DateTime<Utc>> {
    None
}
