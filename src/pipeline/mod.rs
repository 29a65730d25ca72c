//! Pipeline components: context, walk loop, extraction workers, error handling.

pub mod context;
pub mod error_handler;
pub mod metadata;
pub mod orchestrator;
pub mod walk;

pub use context::{PipelineChannels, PipelineContext, PipelineHandles, create_pipeline_channels};
pub use error_handler::report_skipped_paths;
pub use metadata::{FileOutcome, path_to_record, spawn_metadata_workers};
pub use orchestrator::{canonical_root, run_pipeline, shutdown_pipeline_handles};
pub use walk::{WalkOutcome, run_walk_loop, spawn_walk_thread, to_outcome_walkdir};
