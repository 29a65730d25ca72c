//! Walk loop: consumes walkdir results, sends note paths to path_tx, records walk errors.

use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::engine::tools::{
    has_hidden_segment, is_note_file, path_relative_to, should_include_in_walk,
};

use super::context::PipelineContext;

/// One result from a directory walk: either a note file to extract or an error with optional path.
pub enum WalkOutcome {
    Ok(PathBuf),
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert a walkdir result into [`WalkOutcome`]. Directories and non-note files are dropped.
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> Option<WalkOutcome> {
    match r {
        Ok(entry) if entry.file_type().is_file() && is_note_file(entry.path()) => {
            Some(WalkOutcome::Ok(entry.into_path()))
        }
        Ok(_) => None,
        Err(err) => Some(WalkOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        }),
    }
}

/// Serial walk of `ctx.root`. Hidden directories are pruned before descent, so nothing under
/// `.trash/` or `.obsidian/` is ever opened. Once cancelled, every remaining entry is pruned.
fn walkdir_iter(ctx: &PipelineContext) -> Box<dyn Iterator<Item = WalkOutcome>> {
    let root = ctx.root.clone();
    let cancel = ctx.cancel.clone();
    Box::new(
        WalkDir::new(&ctx.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |e| {
                if is_set(&cancel) {
                    return false;
                }
                path_relative_to(e.path(), &root).is_none_or(|rel| !has_hidden_segment(&rel))
            })
            .filter_map(to_outcome_walkdir),
    )
}

fn is_set(cancel: &Option<Arc<AtomicBool>>) -> bool {
    cancel.as_ref().is_some_and(|c| c.load(Ordering::Relaxed))
}

pub fn spawn_walk_thread(path_tx: Sender<PathBuf>, ctx: PipelineContext) -> JoinHandle<usize> {
    thread::spawn(move || {
        let iter = walkdir_iter(&ctx);
        run_walk_loop(path_tx, ctx, iter)
    })
}

/// Run the walk loop: consume `iter` of [`WalkOutcome`], filter with `should_include_in_walk`,
/// send included paths to `path_tx`, log and record errors in `skipped_paths`.
/// Stops early once `ctx.cancel` is set. Drops `path_tx` when done. Returns the count of paths sent.
pub fn run_walk_loop<I>(path_tx: Sender<PathBuf>, ctx: PipelineContext, iter: I) -> usize
where
    I: Iterator<Item = WalkOutcome>,
{
    let mut count = 0_usize;
    for outcome in iter {
        if is_set(&ctx.cancel) {
            log::debug!("Walk cancelled after {} notes", count);
            break;
        }
        match outcome {
            WalkOutcome::Ok(path) => {
                if should_include_in_walk(&path, &ctx.root, &ctx.exclude) {
                    if path_tx.send(path).is_err() {
                        break;
                    }
                    count += 1;
                }
            }
            WalkOutcome::Err { msg, path } => {
                log::warn!("Error accessing path during walk: {}", msg);
                let to_push = path.unwrap_or_else(|| PathBuf::from("<no-path>"));
                ctx.skipped_paths.lock().unwrap().push((to_push, msg));
            }
        }
    }
    drop(path_tx);
    count
}
