use std::io;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;

/// Temp path rows are written to before the table is renamed into place: `<output>.<pkg>.tmp`.
pub fn temp_path_for(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PackagePaths::get().pkg_name().to_string());
    output
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.{}", PackagePaths::get().temp_suffix()))
}

/// Remove a temp file left behind by an earlier run. Missing is fine.
pub fn remove_stale_temp(temp_path: &Path) -> io::Result<()> {
    match std::fs::remove_file(temp_path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Atomically replace `final_path` with the finished temp file.
pub fn rename_temp_to_final(temp_path: &Path, final_path: &Path) -> io::Result<()> {
    std::fs::rename(temp_path, final_path)
}

/// Absolute form of `path` even when the file does not exist yet: the parent is canonicalized
/// and the file name re-attached. Used to keep the output table out of the walk.
pub fn canonical_output_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?;
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    parent.canonicalize().ok().map(|p| p.join(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_sits_next_to_output() {
        let temp = temp_path_for(Path::new("/data/out/sums.csv"));
        assert_eq!(temp, PathBuf::from("/data/out/sums.csv.pathsum.tmp"));
    }

    #[test]
    fn canonical_output_path_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("not-yet.csv");
        let canon = canonical_output_path(&out).unwrap();
        assert_eq!(canon.file_name().unwrap(), "not-yet.csv");
        assert!(canon.is_absolute());
    }

    #[test]
    fn remove_stale_temp_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_stale_temp(&dir.path().join("nothing")).is_ok());
    }
}
