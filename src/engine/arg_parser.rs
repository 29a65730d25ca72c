use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

use crate::Settings;
use crate::utils::config::PackagePaths;
use crate::utils::config_file::{apply_file_to_settings, load_config_file};

/// Scan an Obsidian vault into newline-delimited JSON log records and expose note metrics.
#[derive(Clone, Debug, Parser)]
#[command(name = "notemeter")]
#[command(about = "Scan a vault; emit one log record per changed note, or serve metrics with --metrics.")]
pub struct Cli {
    /// Config file (YAML, or TOML when the extension is .toml). Default: config.yaml.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Vault root to scan. Overrides `vault_path` from the config file.
    #[arg(long, value_name = "DIR")]
    pub vault_path: Option<PathBuf>,

    /// Output file for log records. Default: obsidian_logs.json in the system temp directory.
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace, off).
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Port for the metrics endpoint.
    #[arg(long, value_parser = clap::value_parser!(u16))]
    pub metrics_port: Option<u16>,

    /// Serve metrics instead of writing log records; runs until Ctrl+C.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub metrics: Option<bool>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Show a progress counter while scanning.
    #[arg(long, short = 'p', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub progress: Option<bool>,

    /// Metrics mode: rescan the vault every N seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub scan_interval: Option<u64>,
}

impl Cli {
    /// Config file path, defaulting to `config.yaml` in the working directory.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(PackagePaths::get().default_config_filename()))
    }

    /// Merge defaults, config file, then flags. Fails on an unparseable config file or when no
    /// vault path is given anywhere.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = Settings::default();
        if let Some(file) = load_config_file(&self.config_path())? {
            apply_file_to_settings(&file, &mut settings);
        }
        self.apply_flags(&mut settings);
        if settings.vault_path.is_none() {
            bail!("Vault path must be specified in config file or --vault-path argument");
        }
        Ok(settings)
    }

    fn apply_flags(&self, settings: &mut Settings) {
        if let Some(p) = &self.vault_path {
            settings.vault_path = Some(p.clone());
        }
        if let Some(p) = &self.output {
            settings.output_file = p.clone();
        }
        if let Some(l) = &self.log_level {
            settings.log_level = l.clone();
        }
        if let Some(port) = self.metrics_port {
            settings.metrics_port = port;
        }
        if let Some(m) = self.metrics {
            settings.start_metrics_server = m;
        }
        if !self.exclude.is_empty() {
            settings.exclude = self.exclude.clone();
        }
        if let Some(p) = self.progress {
            settings.progress = p;
        }
        if let Some(secs) = self.scan_interval {
            settings.scan_interval_secs = Some(secs);
        }
    }
}
