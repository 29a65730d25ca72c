//! Pipeline context: shared data passed into the walk thread, and the channels between stages.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::metadata::FileOutcome;
use crate::ScanOptions;

/// Shared context for the walk + extraction pipeline. Built in `run_pipeline` and passed
/// into the walk thread so the walk loop has root, exclude patterns and skip state.
pub struct PipelineContext {
    pub root: PathBuf,
    pub exclude: Vec<String>,
    pub skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>>,
    /// When set, the walk stops sending paths.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Handles returned by [`run_pipeline`](super::run_pipeline): receive outcomes and join when done.
/// `walk_handle` returns the number of note files discovered.
pub struct PipelineHandles {
    pub outcome_rx: Receiver<FileOutcome>,
    pub walk_handle: JoinHandle<usize>,
    pub worker_handles: Vec<JoinHandle<()>>,
    pub skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

/// Channels and shared state for the pipeline. Walk thread gets path_tx and ctx; workers get
/// path_rx and outcome_tx.
pub struct PipelineChannels {
    pub path_tx: Sender<PathBuf>,
    pub path_rx: Receiver<PathBuf>,
    pub outcome_tx: Sender<FileOutcome>,
    pub outcome_rx: Receiver<FileOutcome>,
    pub skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>>,
    pub ctx: PipelineContext,
}

pub fn create_pipeline_channels(
    root: &Path,
    opts: &ScanOptions,
    channel_cap: usize,
) -> PipelineChannels {
    let (path_tx, path_rx) = bounded::<PathBuf>(channel_cap);
    let (outcome_tx, outcome_rx) = bounded::<FileOutcome>(channel_cap);
    let skipped_paths: Arc<Mutex<Vec<(PathBuf, String)>>> = Arc::new(Mutex::new(Vec::new()));

    let ctx = PipelineContext {
        root: root.to_path_buf(),
        exclude: opts.exclude.clone(),
        skipped_paths: Arc::clone(&skipped_paths),
        cancel: opts.cancel.clone(),
    };

    PipelineChannels {
        path_tx,
        path_rx,
        outcome_tx,
        outcome_rx,
        skipped_paths,
        ctx,
    }
}
