//! Pipeline stages: discovery, checksum workers, result closer, and the wiring between them.

pub mod cancel;
pub mod checksum;
pub mod closer;
pub mod context;
pub mod error_handler;
pub mod orchestrator;
pub mod walk;
pub mod watchdog;

pub use cancel::CancelToken;
pub use checksum::{WorkerHandle, checksum_worker_loop, spawn_checksum_workers};
pub use closer::{PipelineReport, close_when_done, spawn_result_closer};
pub use context::{DiscoveryContext, PipelineChannels, PipelineHandles, create_pipeline_channels};
pub use error_handler::{ConfigError, ErrorSlot, PipelineError, RunError};
pub use orchestrator::{ChecksumPipeline, OnRow, checksum_dir, drain_into_sink, spawn_pipeline};
pub use walk::{run_walk_loop, spawn_walk_thread};
pub use watchdog::Watchdog;
