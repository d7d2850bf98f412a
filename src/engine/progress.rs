//! Progress counter for the result drain

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (shows count without percentage)
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " files"
    )))
}

/// Update progress bar if available.
/// Uses try_lock so a contended bar skips the update instead of blocking.
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Create a progress callback function that updates the progress bar.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<Box<dyn Fn(usize)>> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as Box<dyn Fn(usize)>
    })
}

/// Clear the counter line once the drain is over.
pub fn finish_bar(bar: &Option<ProgressBar>) {
    if let Some(bar) = bar
        && let Ok(mut b) = bar.lock()
    {
        let _ = b.refresh();
        eprintln!();
    }
}
