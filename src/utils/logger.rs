use anyhow::{Result, anyhow};
use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;
use std::str::FromStr;

/// Parse a configured level name (`INFO`, `debug`, `off`, ...). Case-insensitive.
/// `WARNING` and `CRITICAL` are accepted as aliases for `warn` and `error`.
pub fn parse_log_level(name: &str) -> Result<LevelFilter> {
    let trimmed = name.trim();
    let canonical = match trimmed.to_ascii_lowercase().as_str() {
        "warning" => "warn",
        "critical" => "error",
        _ => trimmed,
    };
    LevelFilter::from_str(canonical).map_err(|_| {
        anyhow!(
            "unknown log level '{}' (expected one of error, warn, info, debug, trace, off)",
            name
        )
    })
}

pub fn setup_logging(level: LevelFilter) {
    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(env!("CARGO_PKG_NAME"), level) // Our crate: use requested level
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME");
            let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!(
                        "{} [{} {} {}] {}",
                        stamp,
                        name.cyan(),
                        level_str,
                        path,
                        record.args()
                    )
                }
                _ => format!("{} [{}] {}", stamp, name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
