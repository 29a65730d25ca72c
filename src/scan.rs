//! Scan orchestration: one pass over a vault, gated by the watermark, folding into the counters
//! and appending durable records.

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::engine::counters::AggregateCounters;
use crate::engine::progress::{scan_counter, update_progress_bar};
use crate::engine::sink::{LogRecord, append_records, rotate_if_oversized};
use crate::engine::watermark::WatermarkStore;
use crate::pipeline::{
    FileOutcome, PipelineHandles, canonical_root, report_skipped_paths, run_pipeline,
    shutdown_pipeline_handles,
};
use crate::{DocumentRecord, ScanOptions, ScanSummary};

/// What one pass collected before anything is written.
struct Pass {
    summary: ScanSummary,
    records: Vec<DocumentRecord>,
    cancelled: bool,
}

/// Vault label for `root`: its final path component.
pub fn vault_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

fn is_cancelled(cancel: &Option<Arc<AtomicBool>>) -> bool {
    cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed))
}

/// Drive the pipeline to completion. Records whose modification instant is not strictly after
/// `gate` are counted as skipped; the rest are folded into `counters` and, when `keep_records`,
/// returned for writing.
fn run_pass(
    root: &Path,
    vault: &str,
    counters: &AggregateCounters,
    opts: &ScanOptions,
    gate: Option<DateTime<Utc>>,
    keep_records: bool,
) -> Result<Pass> {
    let PipelineHandles {
        outcome_rx,
        walk_handle,
        worker_handles,
        skipped_paths,
    } = run_pipeline(root, opts)?;
    let bar = scan_counter(opts.progress);

    let mut summary = ScanSummary::default();
    let mut records = Vec::new();
    let mut cancelled = false;
    for outcome in outcome_rx.iter() {
        if is_cancelled(&opts.cancel) {
            cancelled = true;
            break;
        }
        if let Some(bar) = &bar {
            update_progress_bar(bar, 1);
        }
        match outcome {
            FileOutcome::Extracted(record) => {
                if gate.is_some_and(|g| record.timestamps.modified_at <= g) {
                    debug!("Unchanged since last run: {}", record.file_path);
                    summary.skipped_by_watermark += 1;
                    continue;
                }
                debug!("Processed {}", record.file_path);
                counters.fold(&record, vault);
                summary.processed += 1;
                if keep_records {
                    records.push(record);
                }
            }
            FileOutcome::Failed { path, reason } => {
                warn!("Skipping {}: {}", path.display(), reason);
                summary.failed += 1;
            }
        }
    }
    cancelled |= is_cancelled(&opts.cancel);
    // Hang up so workers blocked on a full channel exit, then join.
    drop(outcome_rx);
    summary.discovered = shutdown_pipeline_handles(walk_handle, worker_handles)?;
    report_skipped_paths(&skipped_paths);
    if bar.is_some() {
        eprintln!();
    }

    Ok(Pass {
        summary,
        records,
        cancelled,
    })
}

/// Scan `root`, append one durable record per note modified since the last run to `output`,
/// rotate `output` when oversized, and advance the watermark beside it.
///
/// Per-file failures are counted in [`ScanSummary::failed`] and never abort the pass. A failed
/// append is returned as an error before the watermark is touched. A cancelled pass returns an
/// error and writes nothing.
pub fn scan_vault(
    root: &Path,
    output: &Path,
    counters: &AggregateCounters,
    opts: &ScanOptions,
) -> Result<ScanSummary> {
    let root = canonical_root(root)?;
    let vault = vault_name(&root);
    let store = WatermarkStore::for_output(output);
    let previous = store.read();
    let pass_start = Utc::now();
    debug!(
        "Scanning vault {:?} at {} (watermark: {:?})",
        vault,
        root.display(),
        previous
    );

    let Pass {
        mut summary,
        mut records,
        cancelled,
    } = run_pass(&root, &vault, counters, opts, previous, true)?;
    if cancelled {
        anyhow::bail!("Scan cancelled by user; no records or watermark were written");
    }

    if !records.is_empty() {
        records.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        let captured_at = Utc::now();
        let lines: Vec<LogRecord> = records
            .iter()
            .map(|r| LogRecord::new(r, &vault, captured_at))
            .collect();
        let size = append_records(output, &lines)?;
        summary.emitted = lines.len();
        match rotate_if_oversized(output, size, opts.rotate_threshold_bytes) {
            Ok(rotated) => summary.rotated_to = rotated,
            Err(e) => warn!("Output rotation failed: {:#}", e),
        }
    }

    let next = previous.map_or(pass_start, |prev| prev.max(pass_start));
    store.write(next)?;

    info!(
        "Scanned {}: {} discovered, {} processed, {} unchanged, {} failed, {} emitted",
        vault,
        summary.discovered,
        summary.processed,
        summary.skipped_by_watermark,
        summary.failed,
        summary.emitted
    );
    Ok(summary)
}

/// Metrics-only pass: fold every note under `root` into `counters`, ignoring the watermark and
/// emitting nothing. A cancelled pass returns what it folded so far.
pub fn scan_vault_metrics_only(
    root: &Path,
    counters: &AggregateCounters,
    opts: &ScanOptions,
) -> Result<ScanSummary> {
    let root = canonical_root(root)?;
    let vault = vault_name(&root);
    let Pass {
        summary, cancelled, ..
    } = run_pass(&root, &vault, counters, opts, None, false)?;
    if cancelled {
        warn!("Metrics scan of {} cancelled; counters hold a partial pass", vault);
    }
    info!(
        "Metrics scan of {}: {} discovered, {} folded, {} failed",
        vault, summary.discovered, summary.processed, summary.failed
    );
    Ok(summary)
}
