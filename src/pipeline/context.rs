//! Pipeline context: the streams and shared state handed to each stage.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use crate::pipeline::closer::PipelineReport;
use crate::pipeline::error_handler::ErrorSlot;
use crate::pipeline::watchdog::Watchdog;
use crate::utils::config::StreamCaps;
use crate::{ChecksumOpts, ChecksumRecord, NamePattern, PathRecord};

/// What the discovery thread needs: root, filter, and the shared failure slot.
pub struct DiscoveryContext {
    pub root: PathBuf,
    pub pattern: NamePattern,
    pub follow_links: bool,
    /// Canonical paths that are never pushed (output table and its temp file).
    pub skip_paths: Vec<PathBuf>,
    pub errors: ErrorSlot,
}

impl DiscoveryContext {
    pub fn new(root: &Path, opts: &ChecksumOpts, errors: ErrorSlot) -> Self {
        Self {
            root: root.to_path_buf(),
            pattern: opts.pattern.clone(),
            follow_links: opts.follow_links,
            skip_paths: opts.skip_paths.clone(),
            errors,
        }
    }
}

/// Both streams. Discovery gets `path_tx`, workers share `path_rx` and clones of `result_tx`,
/// the closer owns the original `result_tx`, the sink drains `result_rx`.
pub struct PipelineChannels {
    pub path_tx: Sender<PathRecord>,
    pub path_rx: Receiver<PathRecord>,
    pub result_tx: Sender<ChecksumRecord>,
    pub result_rx: Receiver<ChecksumRecord>,
}

pub fn create_pipeline_channels() -> PipelineChannels {
    let (path_tx, path_rx) = bounded::<PathRecord>(StreamCaps::PATH);
    let (result_tx, result_rx) = bounded::<ChecksumRecord>(StreamCaps::RESULT);
    PipelineChannels {
        path_tx,
        path_rx,
        result_tx,
        result_rx,
    }
}

/// Handles returned by [`spawn_pipeline`](crate::pipeline::spawn_pipeline): drain `result_rx`
/// until it closes, then join `closer` and stop the watchdog.
pub struct PipelineHandles {
    pub result_rx: Receiver<ChecksumRecord>,
    pub closer: JoinHandle<PipelineReport>,
    pub watchdog: Option<Watchdog>,
    pub errors: ErrorSlot,
}
