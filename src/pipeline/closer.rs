//! Result closer: the only owner that decides when the result stream ends.
//!
//! Workers each hold a clone of the result sender and the closer holds the original. The
//! closer joins discovery and every worker, then drops its sender. Because every clone is
//! gone by then, that drop is the one that closes the stream, and it happens exactly once.

use crossbeam_channel::Sender;
use log::debug;
use std::thread::{self, JoinHandle};

use crate::pipeline::checksum::WorkerHandle;
use crate::pipeline::error_handler::{ErrorSlot, PipelineError};
use crate::{ChecksumRecord, WorkerId};

/// What the supervised tasks reported once they all stopped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Paths discovery pushed; 0 if discovery failed.
    pub matched: usize,
    /// Records delivered per worker, in worker order. Failed workers are omitted.
    pub per_worker: Vec<(WorkerId, usize)>,
    /// Discovery and every worker returned normally, so every matched path was delivered or
    /// the sink stopped taking records.
    pub complete: bool,
}

/// Block until discovery and all workers have returned, then close the result stream.
/// Panics of supervised threads are recorded as failures here.
pub fn close_when_done(
    walk_handle: JoinHandle<Option<usize>>,
    worker_handles: Vec<WorkerHandle>,
    result_tx: Sender<ChecksumRecord>,
    errors: &ErrorSlot,
) -> PipelineReport {
    let mut report = PipelineReport::default();
    let mut complete = true;

    match walk_handle.join() {
        Ok(Some(n)) => report.matched = n,
        Ok(None) => complete = false,
        Err(_) => {
            complete = false;
            errors.record(PipelineError::DiscoveryPanicked);
        }
    }

    for (id, handle) in worker_handles {
        match handle.join() {
            Ok(Some(n)) => report.per_worker.push((id, n)),
            Ok(None) => complete = false,
            Err(_) => {
                complete = false;
                errors.record(PipelineError::WorkerPanicked(id));
            }
        }
    }
    report.complete = complete;

    drop(result_tx);
    debug!(
        "result stream closed ({} matched, {} workers finished cleanly)",
        report.matched,
        report.per_worker.len()
    );
    report
}

/// Run [`close_when_done`] on its own thread.
pub fn spawn_result_closer(
    walk_handle: JoinHandle<Option<usize>>,
    worker_handles: Vec<WorkerHandle>,
    result_tx: Sender<ChecksumRecord>,
    errors: ErrorSlot,
) -> JoinHandle<PipelineReport> {
    thread::spawn(move || close_when_done(walk_handle, worker_handles, result_tx, &errors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cancel::CancelToken;
    use crate::{Digest, PathRecord};
    use crossbeam_channel::bounded;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn record(n: usize, worker: WorkerId) -> ChecksumRecord {
        ChecksumRecord {
            path: PathRecord::from(format!("f{n}")),
            digest: Digest::Md5([n as u8; 16]),
            worker,
        }
    }

    #[test]
    fn closes_only_after_every_producer_finished() {
        let (result_tx, result_rx) = bounded::<ChecksumRecord>(0);
        let finished = Arc::new(AtomicUsize::new(0));
        let errors = ErrorSlot::new(CancelToken::new());

        let walk = thread::spawn(|| Some(6));
        let workers: Vec<WorkerHandle> = (1..=3)
            .map(|n| {
                let id = WorkerId(n);
                let tx = result_tx.clone();
                let finished = Arc::clone(&finished);
                let h = thread::spawn(move || {
                    for k in 0..2 {
                        thread::sleep(Duration::from_millis(5 * n as u64));
                        tx.send(record(n * 10 + k, id)).unwrap();
                    }
                    finished.fetch_add(1, Ordering::SeqCst);
                    Some(2)
                });
                (id, h)
            })
            .collect();

        let closer = spawn_result_closer(walk, workers, result_tx, errors.clone());
        let received = result_rx.iter().count();
        // the stream only ends once all three producers are done
        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert_eq!(received, 6);

        let report = closer.join().unwrap();
        assert_eq!(report.matched, 6);
        assert!(report.complete);
        assert_eq!(
            report.per_worker,
            vec![(WorkerId(1), 2), (WorkerId(2), 2), (WorkerId(3), 2)]
        );
        assert!(!errors.is_set());
    }

    #[test]
    fn failed_tasks_are_left_out_of_report() {
        let (result_tx, result_rx) = bounded::<ChecksumRecord>(0);
        let errors = ErrorSlot::new(CancelToken::new());
        let walk = thread::spawn(|| None);
        let workers: Vec<WorkerHandle> = vec![
            (WorkerId(1), thread::spawn(|| Some(0))),
            (WorkerId(2), thread::spawn(|| None)),
        ];
        let report = close_when_done(walk, workers, result_tx, &errors);
        assert_eq!(report.matched, 0);
        assert_eq!(report.per_worker, vec![(WorkerId(1), 0)]);
        assert!(!report.complete);
        assert!(result_rx.recv().is_err());
    }

    #[test]
    fn worker_panic_becomes_failure() {
        let (result_tx, _result_rx) = bounded::<ChecksumRecord>(0);
        let errors = ErrorSlot::new(CancelToken::new());
        let walk = thread::spawn(|| Some(0));
        let workers: Vec<WorkerHandle> = vec![(
            WorkerId(7),
            thread::spawn(|| -> Option<usize> { panic!("boom") }),
        )];
        close_when_done(walk, workers, result_tx, &errors);
        assert!(matches!(
            errors.take(),
            Some(PipelineError::WorkerPanicked(WorkerId(7)))
        ));
        assert!(errors.cancel_token().is_cancelled());
    }
}
