//! Load `.pathsum.toml` (or an explicit `--config` file). CLI only; lib callers build
//! [`ChecksumOpts`](crate::ChecksumOpts) themselves.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::{DigestAlgorithm, Opts};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PathsumToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsSection {
    pattern: Option<String>,
    regex: Option<bool>,
    workers: Option<usize>,
    algorithm: Option<DigestAlgorithm>,
    timeout_secs: Option<u64>,
    follow_links: Option<bool>,
    delimiter: Option<char>,
}

/// Parse a config file. Returns None if the file is missing, unreadable or malformed (logged).
pub(crate) fn load_pathsum_toml(path: &Path) -> Option<PathsumToml> {
    let s = std::fs::read_to_string(path).ok()?;
    parse_pathsum_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub(crate) fn parse_pathsum_toml(s: &str) -> Result<PathsumToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field {
            $opts.$field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI flags.
/// The output path and verbosity are never read from the file.
pub(crate) fn apply_file_to_opts(file: &PathsumToml, opts: &mut Opts) {
    let s = &file.settings;
    if let Some(ref p) = s.pattern {
        opts.pattern = p.clone();
    }
    apply_file_opt!(s, opts, regex);
    apply_file_opt!(s, opts, workers);
    apply_file_opt!(s, opts, algorithm);
    apply_file_opt!(s, opts, follow_links);
    if let Some(secs) = s.timeout_secs {
        opts.timeout = Some(Duration::from_secs(secs));
    }
    if let Some(c) = s.delimiter {
        match u8::try_from(c) {
            Ok(b) if b.is_ascii() => opts.delimiter = b,
            _ => log::warn!("ignoring non-ASCII delimiter {:?} from config file", c),
        }
    }
}
