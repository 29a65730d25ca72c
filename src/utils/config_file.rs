//! Load the process config file (CLI only). Lib callers build [`Settings`] or [`ScanOptions`](crate::ScanOptions) directly.
//!
//! Keys are flat. `.toml` files are parsed as TOML, anything else as YAML.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Settings;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigFile {
    vault_path: Option<String>,
    output_file: Option<String>,
    log_level: Option<String>,
    metrics_port: Option<u16>,
    start_metrics_server: Option<bool>,
    exclude: Option<Vec<String>>,
    progress: Option<bool>,
    scan_interval: Option<u64>,
}

/// Load the config file at `path`. Returns None if the file does not exist; a file that exists but
/// cannot be read or parsed is an error.
pub(crate) fn load_config_file(path: &Path) -> Result<Option<ConfigFile>> {
    if !path.exists() {
        log::debug!("No config file at {}", path.display());
        return Ok(None);
    }
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    if s.trim().is_empty() {
        return Ok(Some(ConfigFile::default()));
    }
    let is_toml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let file = if is_toml {
        toml::from_str(&s).with_context(|| format!("parse TOML config {}", path.display()))?
    } else {
        serde_yaml::from_str(&s).with_context(|| format!("parse YAML config {}", path.display()))?
    };
    Ok(Some(file))
}

/// Overwrite settings field from file when present.
macro_rules! apply_file_opt {
    ($file:expr, $settings:expr, $file_field:ident => $settings_field:ident) => {
        if let Some(v) = $file.$file_field.clone() {
            $settings.$settings_field = v;
        }
    };
}

/// Apply file config to settings (only fields present in the file). Call before applying CLI flags.
pub(crate) fn apply_file_to_settings(file: &ConfigFile, settings: &mut Settings) {
    if let Some(ref p) = file.vault_path {
        settings.vault_path = Some(PathBuf::from(p));
    }
    if let Some(ref p) = file.output_file {
        settings.output_file = PathBuf::from(p);
    }
    apply_file_opt!(file, settings, log_level => log_level);
    apply_file_opt!(file, settings, metrics_port => metrics_port);
    apply_file_opt!(file, settings, start_metrics_server => start_metrics_server);
    apply_file_opt!(file, settings, exclude => exclude);
    apply_file_opt!(file, settings, progress => progress);
    if let Some(secs) = file.scan_interval {
        settings.scan_interval_secs = Some(secs);
    }
}
