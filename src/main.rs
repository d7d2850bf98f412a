//! pathsum CLI: digest every matching file under a directory into a two-column table.

use clap::Parser;
use pathsum::engine::arg_parser::Cli;
use pathsum::engine::handle_run;
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let start_time = Instant::now();
    let cli = Cli::parse();
    let code = handle_run(&cli);
    log::debug!("Total time: {:?}", start_time.elapsed());
    code
}
