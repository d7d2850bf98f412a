//! pathsum: concurrent file checksumming pipeline (discover, digest, collect)

pub mod engine;
pub mod pipeline;
pub mod sink;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use pipeline::{
    CancelToken, ChecksumPipeline, ConfigError, ErrorSlot, PipelineError, RunError, checksum_dir,
};
pub use sink::{ChecksumSink, CsvSink, MemorySink, SinkError, SinkRow};
