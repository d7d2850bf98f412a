//! CLI run handler: layer config, run the pipeline into the CSV sink, map the outcome to an exit code.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::engine::arg_parser::Cli;
use crate::engine::progress::{create_counter, finish_bar, progress_callback};
use crate::engine::running_as_root;
use crate::pipeline::{ChecksumPipeline, ConfigError, PipelineError, RunError};
use crate::sink::CsvSink;
use crate::utils::pathsum_toml::{apply_file_to_opts, load_pathsum_toml};
use crate::utils::{canonical_output_path, setup_logging, temp_path_for};
use crate::{Opts, RunSummary};

/// Process exit codes.
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const FAILURE: u8 = 1;
    pub const USAGE: u8 = 2;
}

/// Overwrite opts field from the command line when the flag was given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $cli.$field {
            $opts.$field = v;
        }
    };
}

/// Defaults, then the config file, then command-line flags.
pub fn setup_opts(cli: &Cli) -> Opts {
    let mut opts = Opts::with_output(cli.output.clone());
    opts.dir = cli.dir.clone();

    let config_path = cli.config_path();
    match load_pathsum_toml(&config_path) {
        Some(file) => {
            debug!("loaded config from {}", config_path.display());
            apply_file_to_opts(&file, &mut opts);
        }
        None if cli.config.is_some() => {
            warn!("config file {} not loaded; using defaults", config_path.display());
        }
        None => {}
    }

    if let Some(ref p) = cli.pattern {
        opts.pattern = p.clone();
    }
    apply_cli_opt!(cli, opts, regex);
    apply_cli_opt!(cli, opts, workers);
    apply_cli_opt!(cli, opts, algorithm);
    apply_cli_opt!(cli, opts, follow_links);
    apply_cli_opt!(cli, opts, delimiter);
    apply_cli_opt!(cli, opts, verbose);
    if let Some(secs) = cli.timeout {
        opts.timeout = Some(Duration::from_secs(secs));
    }
    opts
}

/// The output table and its temp file, so a table written inside DIR never digests itself.
fn output_skip_paths(opts: &Opts) -> Vec<PathBuf> {
    [opts.output.clone(), temp_path_for(&opts.output)]
        .iter()
        .filter_map(|p| canonical_output_path(p))
        .collect()
}

fn run(opts: &Opts) -> Result<RunSummary> {
    let checksum_opts = opts.checksum_opts(output_skip_paths(opts))?;
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );

    let mut sink = CsvSink::create(&opts.output, opts.delimiter)
        .with_context(|| format!("cannot open output {}", opts.output.display()))?;
    let pipeline = ChecksumPipeline::new(&opts.dir, checksum_opts)?;

    let slot = pipeline.error_slot();
    if let Err(e) = ctrlc::set_handler(move || {
        slot.record(PipelineError::Interrupted);
    }) {
        warn!("could not install Ctrl+C handler: {}", e);
    }

    let bar = opts.verbose.then(|| create_counter("Hashing"));
    let on_row = progress_callback(&bar);
    let result = pipeline.run(&mut sink, on_row.as_deref());
    finish_bar(&bar);

    let summary = result?;
    info!("wrote {}", sink.output_path().display());
    Ok(summary)
}

/// Exit code for a failed run: usage errors are 2, everything else is 1.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    let is_usage = err.downcast_ref::<ConfigError>().is_some()
        || matches!(err.downcast_ref::<RunError>(), Some(RunError::Config(_)));
    if is_usage {
        ExitCodes::USAGE
    } else {
        ExitCodes::FAILURE
    }
}

/// Run one checksum pass over `cli.dir` into `cli.output`.
pub fn handle_run(cli: &Cli) -> ExitCode {
    setup_logging(cli.verbose.unwrap_or(false));
    let opts = setup_opts(cli);
    if running_as_root() {
        info!("Running as root. Unreadable files will not be caught by permission checks.");
    }
    match run(&opts) {
        Ok(_) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}
