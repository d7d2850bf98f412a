//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived file names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    temp_suffix: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                temp_suffix: format!("{pkg}.tmp"),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Config file looked up in the root directory when `--config` is not given.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Suffix appended to the output file name while rows are being written.
    pub fn temp_suffix(&self) -> &str {
        &self.temp_suffix
    }
}

// ---- Defaults ----

/// Match-all base-name pattern.
pub const DEFAULT_PATTERN: &str = "*";

/// Column delimiter of the output table.
pub const DEFAULT_DELIMITER: u8 = b',';

// ---- Worker threads ----

pub struct WorkerPoolConsts;

impl WorkerPoolConsts {
    pub const DEFAULT_WORKERS: usize = 10;
}

// ---- Streams ----

/// Channel capacities. Zero is a rendezvous: the sender blocks until a receiver takes the value.
pub struct StreamCaps;

impl StreamCaps {
    /// Discovery hands each path directly to an idle worker.
    pub const PATH: usize = 0;
    /// Workers hand each record directly to the draining thread.
    pub const RESULT: usize = 0;
}

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}
