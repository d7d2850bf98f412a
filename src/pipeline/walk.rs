//! Path discovery: a single thread walks the root and pushes matching files onto the path stream.

use crossbeam_channel::Sender;
use log::debug;
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::PathRecord;
use crate::engine::tools::is_candidate;
use crate::pipeline::error_handler::PipelineError;

use super::context::DiscoveryContext;

/// Spawn the discovery thread. It returns the number of paths pushed, or `None` after recording
/// its failure in the context's error slot.
pub fn spawn_walk_thread(
    path_tx: Sender<PathRecord>,
    ctx: DiscoveryContext,
) -> JoinHandle<Option<usize>> {
    thread::spawn(move || {
        let iter = WalkDir::new(&ctx.root)
            .follow_links(ctx.follow_links)
            .into_iter();
        match run_walk_loop(path_tx, &ctx, iter) {
            Ok(count) => {
                debug!("{} matching files under {}", count, ctx.root.display());
                Some(count)
            }
            Err(e) => {
                ctx.errors.record(e);
                None
            }
        }
    })
}

/// Consume `iter`, push every candidate onto `path_tx`. The first walk error aborts the loop.
/// Cancellation is polled after every entry; a push already in progress is never interrupted.
/// `path_tx` is dropped on return, which closes the path stream.
pub fn run_walk_loop<I>(
    path_tx: Sender<PathRecord>,
    ctx: &DiscoveryContext,
    iter: I,
) -> Result<usize, PipelineError>
where
    I: Iterator<Item = Result<walkdir::DirEntry, walkdir::Error>>,
{
    let cancel = ctx.errors.cancel_token();
    let mut count = 0_usize;
    for entry in iter {
        let entry = entry.map_err(|e| PipelineError::from_walk(e, &ctx.root))?;
        if is_candidate(&entry, &ctx.pattern, &ctx.skip_paths) {
            if path_tx.send(entry.into_path()).is_err() {
                // every worker has exited
                if cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled);
                }
                debug!("no workers left after {} paths", count);
                return Ok(count);
            }
            count += 1;
        }
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::cancel::CancelToken;
    use crate::pipeline::error_handler::ErrorSlot;
    use crate::{ChecksumOpts, NamePattern};
    use crossbeam_channel::{bounded, unbounded};
    use std::fs;
    use std::path::PathBuf;

    fn ctx(root: &std::path::Path, pattern: &str) -> DiscoveryContext {
        let opts = ChecksumOpts {
            pattern: NamePattern::glob(pattern).unwrap(),
            ..ChecksumOpts::default()
        };
        DiscoveryContext::new(root, &opts, ErrorSlot::new(CancelToken::new()))
    }

    #[test]
    fn pushes_only_matching_files_and_closes_stream() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bdir.txt")).unwrap();
        fs::write(dir.path().join("bdir.txt/a.txt"), "a").unwrap();
        fs::write(dir.path().join("b.log"), "b").unwrap();

        let (tx, rx) = unbounded();
        let c = ctx(dir.path(), "*.txt");
        let iter = WalkDir::new(dir.path()).into_iter();
        assert_eq!(run_walk_loop(tx, &c, iter).unwrap(), 1);

        let got: Vec<PathBuf> = rx.iter().collect();
        assert_eq!(got, vec![dir.path().join("bdir.txt/a.txt")]);
    }

    #[test]
    fn empty_tree_is_success() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = unbounded();
        let c = ctx(dir.path(), "*");
        assert_eq!(
            run_walk_loop(tx, &c, WalkDir::new(dir.path()).into_iter()).unwrap(),
            0
        );
        assert!(rx.recv().is_err());
    }

    #[test]
    fn missing_root_is_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nope");
        let (tx, _rx) = unbounded();
        let c = ctx(&root, "*");
        let err = run_walk_loop(tx, &c, WalkDir::new(&root).into_iter()).unwrap_err();
        assert!(matches!(err, PipelineError::Discovery { .. }));
    }

    #[test]
    fn stops_when_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("f{i}")), "x").unwrap();
        }
        let (tx, _rx) = unbounded();
        let c = ctx(dir.path(), "*");
        c.errors.cancel_token().cancel();
        let err = run_walk_loop(tx, &c, WalkDir::new(dir.path()).into_iter()).unwrap_err();
        assert!(err.is_cancellation());
    }

    #[test]
    fn send_to_dropped_workers_ends_quietly() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), "x").unwrap();
        let (tx, rx) = bounded(0);
        drop(rx);
        let c = ctx(dir.path(), "*");
        assert_eq!(
            run_walk_loop(tx, &c, WalkDir::new(dir.path()).into_iter()).unwrap(),
            0
        );
    }
}
