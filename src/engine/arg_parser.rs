use clap::Parser;
use std::path::PathBuf;

use crate::DigestAlgorithm;
use crate::utils::config::PackagePaths;

struct DefaultArgs;

impl DefaultArgs {
    pub const DIR: &'static str = ".";
}

/// Checksum every matching file under a directory into a two-column table.
#[derive(Clone, Parser)]
#[command(name = "pathsum")]
#[command(about = "Digest every file under DIR whose name matches PATTERN; write path,digest rows.")]
pub struct Cli {
    /// Root directory to walk. Default: current directory.
    #[arg(long, short = 'd', value_name = "DIR", default_value = DefaultArgs::DIR)]
    pub dir: PathBuf,

    /// Base-name pattern (glob syntax, or regex with --regex). Default: "*".
    #[arg(long, short = 'p')]
    pub pattern: Option<String>,

    /// Treat the pattern as a regular expression (unanchored).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub regex: Option<bool>,

    /// Output table path. Rows are written to a temp file and renamed into place.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: PathBuf,

    /// Number of checksum workers. Default: 10.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Digest algorithm.
    #[arg(long, short = 'a', value_enum)]
    pub algorithm: Option<DigestAlgorithm>,

    /// Abort the run after this many seconds.
    #[arg(long, short = 't', value_name = "SECS", value_parser = clap::value_parser!(u64))]
    pub timeout: Option<u64>,

    /// Follow symbolic links.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Column delimiter (single ASCII character). Default: ','.
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,

    /// Verbose output and progress counter.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    /// Config file. Default: `.pathsum.toml` in DIR when present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Config file path, defaulting to the package config filename in the target directory.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.dir.join(PackagePaths::get().config_filename()))
    }
}

/// Accept one ASCII character; `\t` and `tab` are spelled out for convenience.
pub fn parse_delimiter(s: &str) -> Result<u8, String> {
    match s {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Ok(c as u8),
        _ => Err(format!("delimiter must be a single ASCII character, got {s:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_required() {
        assert!(Cli::try_parse_from(["pathsum"]).is_err());
        assert!(Cli::try_parse_from(["pathsum", "-o", "sums.csv"]).is_ok());
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "pathsum", "-d", "/tmp", "-p", "*.log", "-o", "out.csv", "-w", "4", "-a", "blake3",
            "-t", "5", "-f", "--delimiter", "tab", "-v",
        ])
        .unwrap();
        assert_eq!(cli.dir, PathBuf::from("/tmp"));
        assert_eq!(cli.pattern.as_deref(), Some("*.log"));
        assert_eq!(cli.workers, Some(4));
        assert_eq!(cli.algorithm, Some(DigestAlgorithm::Blake3));
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.follow_links, Some(true));
        assert_eq!(cli.delimiter, Some(b'\t'));
        assert_eq!(cli.verbose, Some(true));
        assert_eq!(cli.regex, None);
        assert_eq!(cli.config_path(), PathBuf::from("/tmp/.pathsum.toml"));
    }

    #[test]
    fn delimiter_must_be_one_ascii_char() {
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("é").is_err());
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("\"").is_err());
    }
}
