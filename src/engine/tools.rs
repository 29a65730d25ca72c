//! Path and filter utilities

use std::path::{Component, Path, PathBuf};

use crate::utils::config::{HIDDEN_SEGMENT_MARKER, NOTE_EXTENSION};

/// Convert absolute path to relative path from base
pub fn path_relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    path.strip_prefix(base).ok().map(|p| p.to_path_buf())
}

/// Normalize a relative path for records: forward slashes on every platform.
pub fn path_to_record_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// True if any component of `rel` (a path relative to the vault root) is hidden (starts with `.`).
pub fn has_hidden_segment(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|s| s.starts_with(HIDDEN_SEGMENT_MARKER)),
        _ => false,
    })
}

/// True if `path` has the note extension (`.md`, case-insensitive).
pub fn is_note_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(NOTE_EXTENSION))
}

/// Returns true if the path should be included in the walk (not excluded).
///
/// `path` is absolute; the hidden-segment check only looks at the part below `root`, so a vault
/// that itself lives under a hidden directory is still scanned.
pub fn should_include_in_walk(path: &Path, root: &Path, exclude_patterns: &[String]) -> bool {
    if path == root {
        return false;
    }
    let rel = match path_relative_to(path, root) {
        Some(rel) => rel,
        None => return false,
    };
    if has_hidden_segment(&rel) {
        return false;
    }
    if exclude_patterns.is_empty() {
        return true;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return true,
    };
    let rel_str = path_to_record_string(&rel);
    !exclude_patterns
        .iter()
        .any(|pattern| glob_match(pattern, name) || glob_match(pattern, &rel_str))
}

/// Simple glob pattern matching (supports * and ?)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_chars(&pattern, &text)
}

fn glob_match_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((&'*', rest)) => {
            if rest.is_empty() {
                return true; // trailing * matches everything
            }
            (0..=text.len()).any(|skip| glob_match_chars(rest, &text[skip..]))
        }
        Some((&'?', rest)) => !text.is_empty() && glob_match_chars(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && glob_match_chars(rest, &text[1..]),
    }
}
