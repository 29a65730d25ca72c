//! CLI command handler: one durable scan by default; with --metrics, serve counters until Ctrl+C.

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use log::{debug, info, warn};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::engine::counters::AggregateCounters;
use crate::scan::{scan_vault, scan_vault_metrics_only};
use crate::server::MetricsServer;
use crate::utils::{parse_log_level, setup_logging};
use crate::{ScanOptions, Settings};

/// Cancel flag for scans plus a channel that fires once on Ctrl+C.
fn install_interrupt_handler() -> Result<(Arc<AtomicBool>, Receiver<()>)> {
    let cancel_requested = Arc::new(AtomicBool::new(false));
    let cancel_requested_handler = Arc::clone(&cancel_requested);
    let (stop_tx, stop_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        cancel_requested_handler.store(true, Ordering::Relaxed);
        let _ = stop_tx.try_send(());
    })
    .context("set Ctrl+C handler")?;
    Ok((cancel_requested, stop_rx))
}

/// Load settings, set up logging, then run the durable scan or the metrics endpoint.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let settings = cli.settings()?;
    setup_logging(parse_log_level(&settings.log_level)?);
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        settings
    );

    let Some(vault) = settings.vault_path.as_deref() else {
        bail!("Vault path must be specified in config file or --vault-path argument");
    };
    if !vault.is_dir() {
        bail!("Vault path does not exist: {}", vault.display());
    }

    let (cancel, stop_rx) = install_interrupt_handler()?;
    let mut opts = ScanOptions::from(&settings);
    opts.cancel = Some(cancel);
    let counters = Arc::new(AggregateCounters::new());

    if settings.start_metrics_server {
        run_metrics_mode(vault, &settings, &opts, counters, &stop_rx)
    } else {
        info!("Scanning vault at {}", vault.display());
        scan_vault(vault, &settings.output_file, &counters, &opts)?;
        Ok(())
    }
}

/// Serve the counters, fold the vault once (or every `scan_interval`), idle until Ctrl+C.
fn run_metrics_mode(
    vault: &Path,
    settings: &Settings,
    opts: &ScanOptions,
    counters: Arc<AggregateCounters>,
    stop_rx: &Receiver<()>,
) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.metrics_port));
    let server = MetricsServer::start(addr, Arc::clone(&counters))?;

    scan_vault_metrics_only(vault, &counters, opts)?;
    match settings.scan_interval_secs {
        Some(secs) => {
            let interval = Duration::from_secs(secs);
            info!("Rescanning every {}s; press Ctrl+C to stop", secs);
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = scan_vault_metrics_only(vault, &counters, opts) {
                            warn!("Metrics rescan failed: {:#}", e);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        }
        None => {
            info!("Metrics ready; press Ctrl+C to stop");
            let _ = stop_rx.recv();
        }
    }

    info!("Shutting down");
    server.stop();
    Ok(())
}
