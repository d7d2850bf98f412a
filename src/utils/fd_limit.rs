//! File descriptor limit check for the worker pool (Unix).

/// Descriptors held by one checksum worker: the open file plus a mapping for large files.
pub const FDS_PER_WORKER: usize = 2;

/// Descriptors the single walker may hold open (walkdir keeps a handful of directory handles).
pub const FDS_FOR_DISCOVERY: usize = 10;

/// Fraction of the process FD limit the pipeline may use (leave headroom for other code).
const FD_LIMIT_FRACTION: f64 = 0.8;

/// Returns the soft limit for max open file descriptors, or `None` if unavailable (e.g. Windows).
#[cfg(unix)]
pub fn max_open_fds() -> Option<u64> {
    use std::mem::MaybeUninit;
    let mut rlim = MaybeUninit::<libc::rlimit>::uninit();
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, rlim.as_mut_ptr()) } != 0 {
        return None;
    }
    let rlim = unsafe { rlim.assume_init() };
    let cur = rlim.rlim_cur;
    // RLIM_INFINITY is typically !0 or u64::MAX; treat as "no practical limit"
    if cur == libc::RLIM_INFINITY || cur > i64::MAX as u64 {
        return None;
    }
    Some(cur)
}

#[cfg(not(unix))]
pub fn max_open_fds() -> Option<u64> {
    None
}

/// Largest pool that stays under ~80% of `limit` descriptors.
pub fn max_workers_for_limit(limit: u64) -> usize {
    let usable = (limit as f64 * FD_LIMIT_FRACTION) as usize;
    (usable.saturating_sub(FDS_FOR_DISCOVERY) / FDS_PER_WORKER).max(1)
}

/// Warn when `workers` would likely exhaust the FD limit. The pool size is left as requested.
/// Returns the suggested ceiling when a warning was emitted.
pub fn warn_if_over_fd_limit(workers: usize) -> Option<usize> {
    let ceiling = max_workers_for_limit(max_open_fds()?);
    if workers > ceiling {
        log::warn!(
            "{} workers may exceed the open-file limit (suggested at most {}); reads may fail with EMFILE",
            workers,
            ceiling
        );
        return Some(ceiling);
    }
    None
}
