//! Shared cancellation signal for discovery and the worker pool.
//!
//! The signal is a flag for cheap polling plus a channel whose only sender is dropped on
//! cancel, so `done()` becomes permanently ready and can sit in a `select!` next to any
//! blocking send or receive.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

struct CancelInner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

/// Cloneable handle to one cancellation signal. Tripping any clone trips them all.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, done) = bounded::<()>(0);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
        }
    }

    /// Trip the signal. Returns true for the call that actually tripped it.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        drop(
            self.inner
                .trigger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Never yields a value; becomes ready (disconnected) once the token is cancelled.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }
}
