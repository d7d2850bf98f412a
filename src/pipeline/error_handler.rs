//! Error taxonomy and the single-writer-wins failure slot shared by every pipeline task.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;

use crate::WorkerId;
use crate::pipeline::cancel::CancelToken;
use crate::sink::SinkError;

/// Failure of discovery or a worker. Only the first one recorded is ever surfaced.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("walking {}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Returned by a task that unwound because another task tripped the signal.
    #[error("cancelled")]
    Cancelled,

    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("interrupted")]
    Interrupted,

    #[error("{0} panicked")]
    WorkerPanicked(WorkerId),

    #[error("discovery thread panicked")]
    DiscoveryPanicked,

    #[error("result closer panicked")]
    CloserPanicked,
}

impl PipelineError {
    /// Convert a walkdir error, falling back to `root` when it carries no path.
    pub fn from_walk(err: walkdir::Error, root: &Path) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        let source = match err.into_io_error() {
            Some(e) => e,
            // walkdir only omits the io error for symlink loops
            None => io::Error::other("file system loop detected"),
        };
        PipelineError::Discovery { path, source }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// Options rejected before the pipeline starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("invalid glob {pattern:?}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("invalid regex {pattern:?}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
}

/// Outcome of a whole run: the pipeline's first failure, or a sink failure.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Single-assignment failure slot. The first `record` wins; every `record` trips the signal.
#[derive(Clone, Debug)]
pub struct ErrorSlot {
    first: Arc<Mutex<Option<PipelineError>>>,
    cancel: CancelToken,
}

impl ErrorSlot {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            first: Arc::new(Mutex::new(None)),
            cancel,
        }
    }

    /// Store `err` unless a failure is already set, then cancel. Returns true if `err` was kept.
    pub fn record(&self, err: PipelineError) -> bool {
        let kept = {
            let mut slot = self.first.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                log::debug!("first failure: {}", err);
                *slot = Some(err);
                true
            } else {
                if !err.is_cancellation() {
                    log::debug!("discarding later failure: {}", err);
                }
                false
            }
        };
        self.cancel.cancel();
        kept
    }

    pub fn is_set(&self) -> bool {
        self.first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Remove and return the recorded failure.
    pub fn take(&self) -> Option<PipelineError> {
        self.first
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn read_err(name: &str) -> PipelineError {
        PipelineError::Read {
            path: PathBuf::from(name),
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        }
    }

    #[test]
    fn first_record_wins_and_cancels() {
        let slot = ErrorSlot::new(CancelToken::new());
        assert!(!slot.is_set());
        assert!(slot.record(read_err("a")));
        assert!(slot.cancel_token().is_cancelled());
        assert!(!slot.record(read_err("b")));
        assert!(!slot.record(PipelineError::Cancelled));
        match slot.take() {
            Some(PipelineError::Read { path, .. }) => assert_eq!(path, PathBuf::from("a")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn concurrent_records_keep_exactly_one() {
        let slot = ErrorSlot::new(CancelToken::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let slot = slot.clone();
                thread::spawn(move || slot.record(read_err(&format!("f{i}"))))
            })
            .collect();
        let kept = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|k| *k)
            .count();
        assert_eq!(kept, 1);
        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
    }

    #[test]
    fn message_names_path_once_and_cause_once() {
        let err = read_err("a.log");
        assert_eq!(err.to_string(), "reading a.log");
        let chain = format!("{:#}", anyhow::Error::from(RunError::from(err)));
        assert_eq!(chain, "reading a.log: permission denied");
    }

    #[test]
    fn walk_error_keeps_path_and_kind() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let err = walkdir::WalkDir::new(&missing)
            .into_iter()
            .next()
            .unwrap()
            .unwrap_err();
        match PipelineError::from_walk(err, &missing) {
            PipelineError::Discovery { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
