//! Engine module: reading, extraction, counters, output and CLI plumbing

pub mod arg_parser;
pub mod cli;
pub mod counters;
pub mod extract;
pub mod progress;
pub mod reader;
pub mod sink;
pub mod tools;
pub mod watermark;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use counters::{AggregateCounters, VaultTotals};
pub use extract::extract_record;
pub use reader::{RawDocument, parse_document, read_document};
pub use sink::{LogRecord, append_records, rotate_if_oversized};
pub use tools::path_relative_to;
pub use watermark::WatermarkStore;
