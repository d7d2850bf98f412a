//! Checksum worker pool: W threads share the path stream as a work queue and deliver one
//! record per file onto the result stream.

use crossbeam_channel::{Receiver, Sender, select};
use log::debug;
use std::thread::{self, JoinHandle};

use crate::engine::hashing::hash_file;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::error_handler::{ErrorSlot, PipelineError};
use crate::{ChecksumRecord, DigestAlgorithm, PathRecord, WorkerId};

/// Join handle of one worker: records delivered, or `None` after its failure was recorded.
pub type WorkerHandle = (WorkerId, JoinHandle<Option<usize>>);

/// Single worker: take paths until the path stream closes, digest each, deliver the record.
/// Both the take and the delivery race the cancellation signal. A delivery abandoned because of
/// cancellation drops its record.
pub fn checksum_worker_loop(
    id: WorkerId,
    path_rx: &Receiver<PathRecord>,
    result_tx: &Sender<ChecksumRecord>,
    algorithm: DigestAlgorithm,
    cancel: &CancelToken,
) -> Result<usize, PipelineError> {
    let mut delivered = 0_usize;
    loop {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let path = select! {
            recv(path_rx) -> msg => match msg {
                Ok(path) => path,
                Err(_) => break,
            },
            recv(cancel.done()) -> _ => return Err(PipelineError::Cancelled),
        };

        let digest = match hash_file(&path, algorithm) {
            Ok(d) => d,
            Err(source) => return Err(PipelineError::Read { path, source }),
        };
        let record = ChecksumRecord {
            path,
            digest,
            worker: id,
        };

        select! {
            send(result_tx, record) -> res => {
                if res.is_err() {
                    // the sink stopped draining; not a pipeline failure
                    debug!("{}: result stream closed, exiting after {} records", id, delivered);
                    return Ok(delivered);
                }
                delivered += 1;
            }
            recv(cancel.done()) -> _ => return Err(PipelineError::Cancelled),
        }
    }
    Ok(delivered)
}

/// Spawn `workers` threads. Each gets a clone of `path_rx` and `result_tx`; the caller keeps the
/// original `result_tx` for the closer. `path_rx` is consumed so that only workers hold it.
pub fn spawn_checksum_workers(
    path_rx: Receiver<PathRecord>,
    result_tx: &Sender<ChecksumRecord>,
    algorithm: DigestAlgorithm,
    workers: usize,
    errors: &ErrorSlot,
) -> Vec<WorkerHandle> {
    (1..=workers)
        .map(|n| {
            let id = WorkerId(n);
            let path_rx = path_rx.clone();
            let result_tx = result_tx.clone();
            let errors = errors.clone();
            let handle = thread::spawn(move || {
                let outcome = checksum_worker_loop(
                    id,
                    &path_rx,
                    &result_tx,
                    algorithm,
                    errors.cancel_token(),
                );
                match outcome {
                    Ok(n) => {
                        debug!("{}: done, {} records", id, n);
                        Some(n)
                    }
                    Err(e) => {
                        errors.record(e);
                        None
                    }
                }
            });
            (id, handle)
        })
        .collect()
}
