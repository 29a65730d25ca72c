use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crate::ScanOptions;
use crate::pipeline;
use crate::utils::config::{STREAMING_CHANNEL_CAP, WorkerThreadLimits};

/// Start the walk + extraction pipeline. Returns receiver and handles; caller receives from
/// `outcome_rx` and must join `walk_handle` and `worker_handles` when done.
pub fn run_pipeline(root: &Path, opts: &ScanOptions) -> Result<pipeline::PipelineHandles> {
    let root = canonical_root(root)?;
    let num_threads = WorkerThreadLimits::current().worker_count(opts.num_threads);
    debug!("Extracting with {} workers under {}", num_threads, root.display());

    let channels = pipeline::create_pipeline_channels(&root, opts, STREAMING_CHANNEL_CAP);

    let walk_handle = pipeline::spawn_walk_thread(channels.path_tx, channels.ctx);

    let worker_handles = pipeline::spawn_metadata_workers(
        channels.path_rx,
        &channels.outcome_tx,
        &root,
        num_threads,
    );

    // Dropping the last sender closes the channel so the receiver sees the end once workers exit.
    drop(channels.outcome_tx);

    Ok(pipeline::PipelineHandles {
        outcome_rx: channels.outcome_rx,
        walk_handle,
        worker_handles,
        skipped_paths: channels.skipped_paths,
    })
}

/// Shut down the pipeline by joining walk and worker threads (after the outcome channel is
/// drained or dropped). Returns the walk's discovered count.
pub fn shutdown_pipeline_handles(
    walk_handle: JoinHandle<usize>,
    worker_handles: Vec<JoinHandle<()>>,
) -> Result<usize> {
    let discovered = walk_handle
        .join()
        .map_err(|_| anyhow::anyhow!("walk thread panicked"))?;
    for h in worker_handles {
        let _ = h.join();
    }
    Ok(discovered)
}

/// Canonicalize the vault root; fails if it does not exist or is not a directory.
pub fn canonical_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        anyhow::bail!("Vault path does not exist: {}", root.display());
    }
    root.canonicalize()
        .with_context(|| format!("canonicalize vault path {}", root.display()))
}
