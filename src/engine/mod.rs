//! Engine module: CLI surface, file hashing and path helpers

pub mod arg_parser;
pub mod cli;
pub mod hashing;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use hashing::{hash_bytes, hash_file};
pub use tools::{is_candidate, path_to_row_string, running_as_root};
