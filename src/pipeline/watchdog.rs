//! Deadline for a run, expressed as one more source of the shared cancellation signal.

use crossbeam_channel::{Sender, after, bounded, select};
use log::debug;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::pipeline::error_handler::{ErrorSlot, PipelineError};

/// Running deadline thread. Call [`Watchdog::stop`] once the pipeline has finished.
pub struct Watchdog {
    stop_tx: Sender<()>,
    handle: JoinHandle<bool>,
}

impl Watchdog {
    /// Record [`PipelineError::TimedOut`] after `timeout` unless the run is cancelled or stopped first.
    pub fn spawn(timeout: Duration, errors: ErrorSlot) -> Self {
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let handle = thread::spawn(move || {
            let deadline = after(timeout);
            select! {
                recv(deadline) -> _ => {
                    debug!("deadline of {:?} reached", timeout);
                    errors.record(PipelineError::TimedOut(timeout));
                    true
                }
                recv(errors.cancel_token().done()) -> _ => false,
                recv(stop_rx) -> _ => false,
            }
        });
        Self { stop_tx, handle }
    }

    /// Release the thread and wait for it. Returns true if the deadline fired.
    pub fn stop(self) -> bool {
        drop(self.stop_tx);
        self.handle.join().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cancel::CancelToken;

    #[test]
    fn fires_after_deadline() {
        let errors = ErrorSlot::new(CancelToken::new());
        let dog = Watchdog::spawn(Duration::from_millis(10), errors.clone());
        errors.cancel_token().done().recv().unwrap_err();
        assert!(dog.stop());
        assert!(matches!(errors.take(), Some(PipelineError::TimedOut(_))));
    }

    #[test]
    fn stop_before_deadline_records_nothing() {
        let errors = ErrorSlot::new(CancelToken::new());
        let dog = Watchdog::spawn(Duration::from_secs(60), errors.clone());
        assert!(!dog.stop());
        assert!(!errors.is_set());
        assert!(!errors.cancel_token().is_cancelled());
    }

    #[test]
    fn exits_when_run_already_cancelled() {
        let errors = ErrorSlot::new(CancelToken::new());
        errors.record(PipelineError::Interrupted);
        let dog = Watchdog::spawn(Duration::from_secs(60), errors.clone());
        assert!(!dog.stop());
        assert!(matches!(errors.take(), Some(PipelineError::Interrupted)));
    }
}
