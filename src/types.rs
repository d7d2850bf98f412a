//! Public and internal types for the pathsum API and pipeline.

use serde::Deserialize;
use std::ffi::OsStr;
use std::fmt::{self, Write as _};
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::error_handler::ConfigError;
use crate::utils::config::{DEFAULT_DELIMITER, DEFAULT_PATTERN, WorkerPoolConsts};

/// A discovered file path waiting to be digested. Owned by whichever stage currently holds it.
pub type PathRecord = PathBuf;

/// Identifier of the worker that produced a record. Displays as `worker-01`, `worker-02`, ...
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub usize);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{:02}", self.0)
    }
}

/// Digest algorithm used by the worker pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Md5,
    Blake3,
}

impl DigestAlgorithm {
    /// Digest length in bytes.
    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 16,
            DigestAlgorithm::Blake3 => 32,
        }
    }
}

/// Fixed-length content digest. The length depends only on the algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Digest {
    Md5([u8; 16]),
    Blake3([u8; 32]),
}

impl Digest {
    pub fn algorithm(&self) -> DigestAlgorithm {
        match self {
            Digest::Md5(_) => DigestAlgorithm::Md5,
            Digest::Blake3(_) => DigestAlgorithm::Blake3,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Digest::Md5(b) => b,
            Digest::Blake3(b) => b,
        }
    }

    /// Lowercase hexadecimal rendering, two characters per byte.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = String::with_capacity(self.as_bytes().len() * 2);
        for b in self.as_bytes() {
            let _ = write!(s, "{b:02x}");
        }
        f.write_str(&s)
    }
}

/// One digested file, produced by a worker after a successful read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecksumRecord {
    pub path: PathRecord,
    pub digest: Digest,
    pub worker: WorkerId,
}

/// Base-name filter applied by the discoverer. Never sees the containing directories.
#[derive(Clone, Debug, Default)]
pub enum NamePattern {
    /// Matches every file name.
    #[default]
    Any,
    Glob(glob::Pattern),
    /// Unanchored search over the file name.
    Regex(regex::Regex),
}

impl NamePattern {
    /// Compile a glob. Empty and `*` both match everything.
    pub fn glob(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.is_empty() || pattern == DEFAULT_PATTERN {
            return Ok(NamePattern::Any);
        }
        glob::Pattern::new(pattern)
            .map(NamePattern::Glob)
            .map_err(|source| ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Compile a regular expression. Empty matches everything.
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.is_empty() {
            return Ok(NamePattern::Any);
        }
        regex::Regex::new(pattern)
            .map(NamePattern::Regex)
            .map_err(|source| ConfigError::InvalidRegex {
                pattern: pattern.to_string(),
                source: Box::new(source),
            })
    }

    /// Compile `pattern` as a regex when `as_regex`, otherwise as a glob.
    pub fn parse(pattern: &str, as_regex: bool) -> Result<Self, ConfigError> {
        if as_regex {
            Self::regex(pattern)
        } else {
            Self::glob(pattern)
        }
    }

    /// Test a base file name. Non-UTF-8 names are matched lossily.
    pub fn matches_name(&self, name: &OsStr) -> bool {
        match self {
            NamePattern::Any => true,
            NamePattern::Glob(p) => p.matches(&name.to_string_lossy()),
            NamePattern::Regex(r) => r.is_match(&name.to_string_lossy()),
        }
    }
}

/// Lib options for [`checksum_dir`](crate::checksum_dir).
#[derive(Clone, Debug)]
pub struct ChecksumOpts {
    /// Base-name filter.
    pub pattern: NamePattern,
    /// Number of checksum workers. Must be at least 1.
    pub workers: usize,
    pub algorithm: DigestAlgorithm,
    /// Overall deadline. Expiry cancels the run like any other failure.
    pub timeout: Option<Duration>,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
    /// Files never handed to workers even when they match (e.g. the output table and its temp file).
    pub skip_paths: Vec<PathBuf>,
}

impl Default for ChecksumOpts {
    fn default() -> Self {
        Self {
            pattern: NamePattern::Any,
            workers: WorkerPoolConsts::DEFAULT_WORKERS,
            algorithm: DigestAlgorithm::default(),
            timeout: None,
            follow_links: false,
            skip_paths: Vec::new(),
        }
    }
}

impl ChecksumOpts {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

/// Full options (CLI). Use [`ChecksumOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Root directory to walk.
    pub dir: PathBuf,
    /// Raw pattern text; compiled into [`ChecksumOpts::pattern`] once layering is done.
    pub pattern: String,
    /// Treat `pattern` as a regular expression.
    pub regex: bool,
    pub workers: usize,
    pub algorithm: DigestAlgorithm,
    pub timeout: Option<Duration>,
    pub follow_links: bool,
    /// Output table path.
    pub output: PathBuf,
    /// Column delimiter of the output table.
    pub delimiter: u8,
    /// Debug logging and progress counter.
    pub verbose: bool,
}

impl Opts {
    /// Defaults for everything but the output path.
    pub fn with_output(output: PathBuf) -> Self {
        Self {
            dir: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            regex: false,
            workers: WorkerPoolConsts::DEFAULT_WORKERS,
            algorithm: DigestAlgorithm::default(),
            timeout: None,
            follow_links: false,
            output,
            delimiter: DEFAULT_DELIMITER,
            verbose: false,
        }
    }

    /// Compile the pipeline options. Fails on a bad pattern or a zero-sized pool.
    pub fn checksum_opts(&self, skip_paths: Vec<PathBuf>) -> Result<ChecksumOpts, ConfigError> {
        let opts = ChecksumOpts {
            pattern: NamePattern::parse(&self.pattern, self.regex)?,
            workers: self.workers,
            algorithm: self.algorithm,
            timeout: self.timeout,
            follow_links: self.follow_links,
            skip_paths,
        };
        opts.validate()?;
        Ok(opts)
    }
}

/// What a successful run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Paths pushed onto the path stream by discovery.
    pub matched: usize,
    /// Rows accepted by the sink.
    pub written: usize,
    /// Records delivered by each worker, ordered by worker id.
    pub per_worker: Vec<(WorkerId, usize)>,
}
