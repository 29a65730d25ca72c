//! Document reader: decode one note and split its `---` front matter from the body.

use anyhow::{Context, Result, anyhow};
use serde_yaml::{Mapping, Value};
use std::path::Path;

const FRONT_MATTER_DELIMITER: &str = "---";

/// Outcome of looking for a front-matter block at the top of a document.
#[derive(Debug, Clone, PartialEq)]
pub enum Preamble {
    /// Document does not start with a `---` line, or the block is never closed.
    Absent,
    /// Block parsed to a mapping (empty block gives an empty mapping).
    Parsed(Mapping),
    /// Block is delimited but not a YAML mapping; carries the parse message.
    Malformed(String),
}

/// Decoded content of one note.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub text: String,
    pub preamble: Preamble,
    body_start: usize,
}

impl RawDocument {
    /// Content after the front matter. The whole text when the preamble is absent or malformed.
    pub fn body(&self) -> &str {
        &self.text[self.body_start..]
    }

    /// Parsed front-matter mapping, if any.
    pub fn front_matter(&self) -> Option<&Mapping> {
        match &self.preamble {
            Preamble::Parsed(m) => Some(m),
            _ => None,
        }
    }
}

/// Read and decode `path` as UTF-8, then split front matter. I/O and decode failures are errors;
/// a malformed front-matter block is not (see [`Preamble::Malformed`]).
pub fn read_document(path: &Path) -> Result<RawDocument> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let text = String::from_utf8(bytes).map_err(|e| {
        anyhow!(
            "{} is not valid UTF-8 (invalid byte at offset {})",
            path.display(),
            e.utf8_error().valid_up_to()
        )
    })?;
    Ok(parse_document(text))
}

/// Split already-decoded text into preamble and body.
pub fn parse_document(text: String) -> RawDocument {
    let (preamble, body_start) = match locate_front_matter(&text) {
        None => (Preamble::Absent, 0),
        Some((yaml, body_start)) => match parse_front_matter(yaml) {
            Ok(mapping) => (Preamble::Parsed(mapping), body_start),
            Err(msg) => (Preamble::Malformed(msg), 0),
        },
    };
    RawDocument {
        text,
        preamble,
        body_start,
    }
}

/// Find the YAML between an opening `---` first line and the next `---` line.
/// Returns the YAML slice and the byte offset where the body starts.
fn locate_front_matter(text: &str) -> Option<(&str, usize)> {
    let bom = if text.starts_with('\u{feff}') { '\u{feff}'.len_utf8() } else { 0 };
    let first_end = bom + text[bom..].find('\n')?;
    if text[bom..first_end].trim_end() != FRONT_MATTER_DELIMITER {
        return None;
    }
    let yaml_start = first_end + 1;
    let mut pos = yaml_start;
    loop {
        let line_end = text[pos..].find('\n').map(|i| pos + i);
        let line = &text[pos..line_end.unwrap_or(text.len())];
        if line.trim_end() == FRONT_MATTER_DELIMITER {
            let body_start = line_end.map_or(text.len(), |e| e + 1);
            return Some((&text[yaml_start..pos], body_start));
        }
        pos = line_end? + 1;
    }
}

fn parse_front_matter(yaml: &str) -> std::result::Result<Mapping, String> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(m)) => Ok(m),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err("front matter is not a key/value mapping".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
