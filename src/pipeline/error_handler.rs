use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Log paths the walk could not enter. Call after joining walk and workers.
/// Returns the number of skipped paths.
pub fn report_skipped_paths(skipped_paths: &Arc<Mutex<Vec<(PathBuf, String)>>>) -> usize {
    let skipped = skipped_paths.lock().unwrap();
    if !skipped.is_empty() {
        log::warn!(
            "Skipped {} paths due to permission errors or access issues",
            skipped.len()
        );
        for (p, msg) in skipped.iter() {
            log::debug!("  skipped: {} ({})", p.display(), msg);
        }
    }
    skipped.len()
}
