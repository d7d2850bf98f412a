use crossbeam_channel::Receiver;
use log::{debug, error, info};
use std::path::{Path, PathBuf};

use crate::pipeline::cancel::CancelToken;
use crate::pipeline::closer::{PipelineReport, spawn_result_closer};
use crate::pipeline::error_handler::{ConfigError, ErrorSlot, PipelineError, RunError};
use crate::pipeline::watchdog::Watchdog;
use crate::pipeline::{self, DiscoveryContext, PipelineHandles};
use crate::sink::{ChecksumSink, SinkError};
use crate::utils::warn_if_over_fd_limit;
use crate::{ChecksumOpts, ChecksumRecord, RunSummary};

/// Row callback (e.g. progress bar), invoked with 1 after each row the sink accepts.
pub type OnRow<'a> = Option<&'a dyn Fn(usize)>;

/// Start discovery, the worker pool, the closer and (with a timeout) the watchdog.
/// The caller drains `result_rx` until it closes, then joins `closer`.
pub fn spawn_pipeline(root: &Path, opts: &ChecksumOpts, errors: ErrorSlot) -> PipelineHandles {
    warn_if_over_fd_limit(opts.workers);
    let watchdog = opts.timeout.map(|t| Watchdog::spawn(t, errors.clone()));

    let channels = pipeline::create_pipeline_channels();
    let ctx = DiscoveryContext::new(root, opts, errors.clone());

    let walk_handle = pipeline::spawn_walk_thread(channels.path_tx, ctx);
    let worker_handles = pipeline::spawn_checksum_workers(
        channels.path_rx,
        &channels.result_tx,
        opts.algorithm,
        opts.workers,
        &errors,
    );
    debug!("spawned discovery and {} workers", worker_handles.len());

    // The closer takes the last sender it does not share with a worker.
    let closer = spawn_result_closer(
        walk_handle,
        worker_handles,
        channels.result_tx,
        errors.clone(),
    );

    PipelineHandles {
        result_rx: channels.result_rx,
        closer,
        watchdog,
        errors,
    }
}

/// Pass every record to `sink` in arrival order, numbering rows from 1, until the stream closes.
/// On a sink error the receiver is dropped, which makes blocked workers give up delivery.
pub fn drain_into_sink(
    result_rx: Receiver<ChecksumRecord>,
    sink: &mut dyn ChecksumSink,
    on_row: OnRow<'_>,
) -> Result<usize, SinkError> {
    let mut row = 0_usize;
    for record in result_rx.iter() {
        row += 1;
        sink.write_row(row, &record)?;
        if let Some(f) = on_row {
            f(1);
        }
    }
    debug!("result stream closed after {} rows", row);
    Ok(row)
}

/// One configured run over one root. Build it, optionally hand out [`Self::error_slot`] to
/// external cancellation sources, then [`Self::run`] it.
pub struct ChecksumPipeline {
    root: PathBuf,
    opts: ChecksumOpts,
    errors: ErrorSlot,
}

impl ChecksumPipeline {
    pub fn new(root: &Path, opts: ChecksumOpts) -> Result<Self, ConfigError> {
        opts.validate()?;
        Ok(Self {
            root: root.to_path_buf(),
            opts,
            errors: ErrorSlot::new(CancelToken::new()),
        })
    }

    /// Recording a failure here (e.g. [`PipelineError::Interrupted`]) cancels the run.
    pub fn error_slot(&self) -> ErrorSlot {
        self.errors.clone()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.errors.cancel_token().clone()
    }

    /// Run to completion. The pipeline's first failure wins over a sink failure; the sink is
    /// finished even after a pipeline failure so rows that arrived are kept. A sink failure
    /// stops discovery and the workers without counting as a pipeline failure.
    pub fn run(self, sink: &mut dyn ChecksumSink, on_row: OnRow<'_>) -> Result<RunSummary, RunError> {
        let PipelineHandles {
            result_rx,
            closer,
            watchdog,
            errors,
        } = spawn_pipeline(&self.root, &self.opts, self.errors);

        let drained = drain_into_sink(result_rx, sink, on_row);
        // the result stream is closed or abandoned; the deadline no longer applies
        if let Some(dog) = watchdog {
            dog.stop();
        }
        let sink_aborted = drained.is_err() && !errors.is_set();
        if drained.is_err() {
            errors.cancel_token().cancel();
        }

        let report = closer.join().unwrap_or_else(|_| {
            errors.record(PipelineError::CloserPanicked);
            PipelineReport::default()
        });

        let finished = drained.and_then(|rows| sink.finish().map(|()| rows));

        if let Some(err) = settle_failure(errors.take(), &report, sink_aborted) {
            if let Err(sink_err) = finished {
                error!("sink also failed: {:#}", anyhow::Error::from(sink_err));
            }
            return Err(RunError::Pipeline(err));
        }
        let written = finished?;
        let summary = RunSummary {
            matched: report.matched,
            written,
            per_worker: report.per_worker,
        };
        log_run_summary(&summary);
        Ok(summary)
    }
}

/// The failure a finished run reports. A deadline that fired after every task had already
/// completed its work is ignored, and so are the cancellations that follow a sink abort.
fn settle_failure(
    first: Option<PipelineError>,
    report: &PipelineReport,
    sink_aborted: bool,
) -> Option<PipelineError> {
    if sink_aborted {
        if let Some(err) = first {
            debug!("after sink abort: {}", err);
        }
        return None;
    }
    match first {
        Some(PipelineError::TimedOut(t)) if report.complete => {
            debug!("deadline of {:?} reached after all work finished; ignored", t);
            None
        }
        other => other,
    }
}

fn log_run_summary(summary: &RunSummary) {
    info!(
        "{} files matched, {} rows written by {} workers",
        summary.matched,
        summary.written,
        summary.per_worker.len()
    );
    for (id, n) in &summary.per_worker {
        debug!("  {}: {} records", id, n);
    }
}

/// Digest every matching file under `root` into `sink`.
pub fn checksum_dir(
    root: &Path,
    opts: &ChecksumOpts,
    sink: &mut dyn ChecksumSink,
) -> Result<RunSummary, RunError> {
    ChecksumPipeline::new(root, opts.clone())?.run(sink, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report(complete: bool) -> PipelineReport {
        PipelineReport {
            complete,
            ..PipelineReport::default()
        }
    }

    #[test]
    fn late_deadline_is_ignored() {
        let t = Duration::from_millis(5);
        assert!(settle_failure(Some(PipelineError::TimedOut(t)), &report(true), false).is_none());
        assert!(matches!(
            settle_failure(Some(PipelineError::TimedOut(t)), &report(false), false),
            Some(PipelineError::TimedOut(_))
        ));
    }

    #[test]
    fn interrupt_after_completion_still_counts() {
        assert!(matches!(
            settle_failure(Some(PipelineError::Interrupted), &report(true), false),
            Some(PipelineError::Interrupted)
        ));
    }

    #[test]
    fn sink_abort_discards_follow_up_cancellations() {
        assert!(settle_failure(Some(PipelineError::Cancelled), &report(false), true).is_none());
        assert!(settle_failure(None, &report(false), false).is_none());
    }
}
