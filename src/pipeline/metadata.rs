use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crate::DocumentRecord;
use crate::engine::extract::extract_record;
use crate::engine::reader::read_document;
use crate::engine::tools::path_relative_to;

/// Result of extracting one note file. Failures carry the reason instead of unwinding.
#[derive(Debug)]
pub enum FileOutcome {
    Extracted(DocumentRecord),
    Failed { path: PathBuf, reason: String },
}

/// Single extraction worker: read paths from path_rx, turn into outcomes, send on outcome_tx.
/// Stops early when the receiving side hangs up.
fn metadata_worker_loop(path_rx: Receiver<PathBuf>, outcome_tx: Sender<FileOutcome>, root: PathBuf) {
    while let Ok(abs_path) = path_rx.recv() {
        let outcome = match path_to_record(&abs_path, &root) {
            Ok(record) => FileOutcome::Extracted(record),
            Err(e) => FileOutcome::Failed {
                path: abs_path,
                reason: format!("{:#}", e),
            },
        };
        if outcome_tx.send(outcome).is_err() {
            break;
        }
    }
}

/// Spawn extraction workers. Caller must drop its sender after this so the outcome channel
/// closes when the workers exit.
pub fn spawn_metadata_workers(
    path_rx: Receiver<PathBuf>,
    outcome_tx: &Sender<FileOutcome>,
    root: &Path,
    num_threads: usize,
) -> Vec<JoinHandle<()>> {
    let root = root.to_path_buf();
    (0..num_threads)
        .map(|_| {
            let path_rx = path_rx.clone();
            let outcome_tx = outcome_tx.clone();
            let root = root.clone();
            thread::spawn(move || metadata_worker_loop(path_rx, outcome_tx, root))
        })
        .collect()
}

/// Read, decode and extract one note into a [`DocumentRecord`].
pub fn path_to_record(abs_path: &Path, root: &Path) -> Result<DocumentRecord> {
    let doc = read_document(abs_path)?;
    let meta = std::fs::metadata(abs_path)
        .with_context(|| format!("stat {}", abs_path.display()))?;
    let rel = path_relative_to(abs_path, root).unwrap_or_else(|| abs_path.to_path_buf());
    extract_record(&doc, &rel, &meta)
}
