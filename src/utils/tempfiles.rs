use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sibling temp path for `final_path` (`<name>.tmp` in the same directory, so rename stays on one filesystem).
pub fn temp_path_for(final_path: &Path) -> PathBuf {
    let name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    final_path
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Write `contents` to the temp sibling of `final_path`, sync it, then rename over `final_path`.
/// On any failure before the rename the previous `final_path` is left untouched.
pub fn write_atomically(final_path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = temp_path_for(final_path);
    if temp_path.exists() {
        fs::remove_file(&temp_path)
            .with_context(|| format!("remove stale temp file at {}", temp_path.display()))?;
    }
    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("create temp file {}", temp_path.display()))?;
    file.write_all(contents)
        .and_then(|_| file.sync_all())
        .with_context(|| format!("write temp file {}", temp_path.display()))?;
    drop(file);
    rename_temp_to_final(&temp_path, final_path)
}

pub fn rename_temp_to_final(temp_path: &Path, final_path: &Path) -> Result<()> {
    fs::rename(temp_path, final_path).with_context(|| {
        format!(
            "atomic rename temp file to final path ({} -> {})",
            temp_path.display(),
            final_path.display()
        )
    })
}
