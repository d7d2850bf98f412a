pub mod config;
pub mod fd_limit;
pub mod logger;
pub mod pathsum_toml;
pub mod tempfiles;

pub use config::*;
pub use fd_limit::{max_open_fds, warn_if_over_fd_limit};
pub use logger::setup_logging;
pub use tempfiles::{canonical_output_path, remove_stale_temp, rename_temp_to_final, temp_path_for};
