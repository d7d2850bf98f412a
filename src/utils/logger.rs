use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Last path segment of a record target: `pathsum::pipeline::checksum` logs as `checksum`.
fn stage_of(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

/// Install the process logger. Our crate logs at Info (Debug when `verbose`), dependencies at Warn.
/// `RUST_LOG` still applies on top. Later calls are ignored.
///
/// Debug lines carry the stage that emitted them (`walk`, `checksum`, `closer`, ...) so the
/// interleaved output of discovery, workers and the drain can be told apart.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| {
            let name = env!("CARGO_PKG_NAME").cyan();
            let line = match record.level() {
                Level::Error => format!(
                    "[{} {} {}] {}",
                    name,
                    "ERROR".red(),
                    record.target().white(),
                    record.args()
                ),
                Level::Warn => format!(
                    "[{} {} {}] {}",
                    name,
                    "WARN".yellow(),
                    record.target().white(),
                    record.args()
                ),
                Level::Info => format!("[{}] {}", name, record.args()),
                Level::Debug | Level::Trace => format!(
                    "[{} {}] {}",
                    name,
                    stage_of(record.target()).dimmed(),
                    record.args()
                ),
            };
            writeln!(buf, "{}", line)
        })
        .try_init();
}
