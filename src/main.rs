//! Notemeter CLI: scan a vault into log records, or serve note metrics with --metrics.

use anyhow::Result;
use clap::Parser;
use notemeter::engine::arg_parser::Cli;
use notemeter::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
