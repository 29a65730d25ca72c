pub mod config;
pub mod config_file;
pub mod logger;
pub mod tempfiles;

pub use config::*;
pub use logger::{parse_log_level, setup_logging};
pub use tempfiles::{rename_temp_to_final, temp_path_for, write_atomically};
