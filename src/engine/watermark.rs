//! Watermark store: the instant of the last completed scan, kept in `.last_run` beside the output file.

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;
use crate::utils::tempfiles::write_atomically;

/// Persisted "last processed" instant for one output destination.
#[derive(Clone, Debug)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    /// Store for `output_file`: `<output dir>/.last_run`.
    pub fn for_output(output_file: &Path) -> Self {
        let dir = output_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self {
            path: dir.join(PackagePaths::get().watermark_filename()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last persisted instant. None when the file is missing, unreadable or unparseable; the
    /// last two are logged, and every document is then processed.
    pub fn read(&self) -> Option<DateTime<Utc>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No watermark at {}; processing every note", self.path.display());
                return None;
            }
            Err(e) => {
                warn!(
                    "Cannot read watermark {}: {}; processing every note",
                    self.path.display(),
                    e
                );
                return None;
            }
        };
        let parsed = parse_watermark(&raw);
        if parsed.is_none() {
            warn!(
                "Unparseable watermark {:?} in {}; processing every note",
                raw.trim(),
                self.path.display()
            );
        }
        parsed
    }

    /// Persist `instant`, replacing any previous value through a temp file and rename.
    pub fn write(&self, instant: DateTime<Utc>) -> Result<()> {
        let line = format!("{}\n", format_instant(instant));
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create watermark directory {}", dir.display()))?;
        }
        write_atomically(&self.path, line.as_bytes())?;
        debug!("Watermark {} -> {}", self.path.display(), line.trim_end());
        Ok(())
    }
}

/// RFC 3339 in UTC with as many fractional digits as needed.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse RFC 3339, or a naive ISO-8601 local time (no offset).
pub fn parse_watermark(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
