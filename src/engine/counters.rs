//! Aggregate counters: process-lifetime tallies per vault and per note, readable while a scan
//! folds into them.
//!
//! All state sits behind one mutex; [`AggregateCounters::fold`] and
//! [`AggregateCounters::snapshot`] each take it once, so a snapshot always reflects a whole
//! number of folds. Nothing is ever removed or decremented.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::DocumentRecord;
use crate::utils::config::METRIC_PREFIX;

#[derive(Debug, Default)]
struct VaultTally {
    notes: BTreeSet<String>,
    tags: BTreeSet<String>,
    words: u64,
    links: u64,
    /// Words folded per note name. Re-observing a note adds again.
    note_words: BTreeMap<String, u64>,
}

#[derive(Debug, Default)]
struct CounterState {
    vaults: BTreeMap<String, VaultTally>,
    /// Note names across every vault.
    notes: BTreeSet<String>,
    /// Tags across every vault.
    tags: BTreeSet<String>,
}

/// Point-in-time totals for one vault.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VaultTotals {
    pub notes: usize,
    pub tags: usize,
    pub words: u64,
    pub links: u64,
}

/// Shared counters. Wrap in an `Arc` to hand to both the scan and the metrics endpoint.
#[derive(Debug, Default)]
pub struct AggregateCounters {
    state: Mutex<CounterState>,
}

impl AggregateCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CounterState> {
        // Updates are unions and additions only, so poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fold one record into `vault`'s tallies and the process-wide sets.
    pub fn fold(&self, record: &DocumentRecord, vault: &str) {
        let tags = record.tags.unique();
        let mut state = self.state();

        state.notes.insert(record.note_name.clone());
        state.tags.extend(tags.iter().map(|t| t.to_string()));

        let tally = state.vaults.entry(vault.to_string()).or_default();
        tally.notes.insert(record.note_name.clone());
        tally.tags.extend(tags.iter().map(|t| t.to_string()));
        tally.words += record.stats.word_count;
        tally.links += record.links.len() as u64;
        *tally
            .note_words
            .entry(record.note_name.clone())
            .or_default() += record.stats.word_count;
    }

    /// Totals for `vault`, or None if nothing has been folded for it.
    pub fn vault_totals(&self, vault: &str) -> Option<VaultTotals> {
        self.state().vaults.get(vault).map(|t| VaultTotals {
            notes: t.notes.len(),
            tags: t.tags.len(),
            words: t.words,
            links: t.links,
        })
    }

    /// Distinct note names across all vaults.
    pub fn unique_notes(&self) -> usize {
        self.state().notes.len()
    }

    /// Distinct tags across all vaults.
    pub fn unique_tags(&self) -> usize {
        self.state().tags.len()
    }

    /// Render every counter in the text exposition format.
    pub fn snapshot(&self) -> String {
        let state = self.state();
        let mut out = String::new();

        for (name, help, kind, value) in VAULT_FAMILIES {
            write_family(&mut out, name, help, kind, per_vault(&state, *value));
        }

        let note_words = state
            .vaults
            .iter()
            .flat_map(|(vault, t)| {
                t.note_words.iter().map(move |(note, words)| {
                    (
                        vec![("vault", vault.as_str()), ("note_name", note.as_str())],
                        *words,
                    )
                })
            })
            .collect();
        write_family(
            &mut out,
            "note_words_total",
            "Words folded per note.",
            "counter",
            note_words,
        );
        write_family(
            &mut out,
            "notes_seen_total",
            "Unique notes seen across all vaults.",
            "counter",
            vec![(Vec::new(), state.notes.len() as u64)],
        );
        write_family(
            &mut out,
            "tags_seen_total",
            "Unique tags seen across all vaults.",
            "counter",
            vec![(Vec::new(), state.tags.len() as u64)],
        );

        out
    }
}

/// Label pairs and value for each sample of one metric family.
type Samples<'a> = Vec<(Vec<(&'a str, &'a str)>, u64)>;

/// (name, help, type, value) of every family labeled by vault only.
const VAULT_FAMILIES: &[(&str, &str, &str, fn(&VaultTally) -> u64)] = &[
    ("notes_total", "Unique notes seen per vault.", "counter", |t: &VaultTally| t.notes.len() as u64),
    ("words_total", "Words folded per vault.", "counter", |t: &VaultTally| t.words),
    ("tags_total", "Unique tags seen per vault.", "counter", |t: &VaultTally| t.tags.len() as u64),
    ("vault_notes", "Current unique note count per vault.", "gauge", |t: &VaultTally| t.notes.len() as u64),
    ("vault_words", "Current total words per vault.", "gauge", |t: &VaultTally| t.words),
    ("vault_tags", "Current unique tag count per vault.", "gauge", |t: &VaultTally| t.tags.len() as u64),
    ("vault_links", "Current total links per vault.", "gauge", |t: &VaultTally| t.links),
];

fn per_vault(state: &CounterState, value: fn(&VaultTally) -> u64) -> Samples<'_> {
    state
        .vaults
        .iter()
        .map(|(vault, t)| (vec![("vault", vault.as_str())], value(t)))
        .collect()
}

fn write_family(out: &mut String, name: &str, help: &str, kind: &str, samples: Samples<'_>) {
    let _ = writeln!(out, "# HELP {METRIC_PREFIX}_{name} {help}");
    let _ = writeln!(out, "# TYPE {METRIC_PREFIX}_{name} {kind}");
    for (labels, value) in samples {
        let _ = write!(out, "{METRIC_PREFIX}_{name}");
        if !labels.is_empty() {
            let rendered: Vec<String> = labels
                .iter()
                .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
                .collect();
            let _ = write!(out, "{{{}}}", rendered.join(","));
        }
        let _ = writeln!(out, " {value}");
    }
}

/// Escape `\`, `"` and newlines in a label value.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }
    escaped
}
