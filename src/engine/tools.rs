//! Path and filter utilities

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

use crate::NamePattern;

/// Render a walked path for the output table: a leading `./` is dropped and separators are
/// written as `/` on every platform.
pub fn path_to_row_string(path: &Path) -> String {
    let path = path.strip_prefix(".").unwrap_or(path);
    let s = path.to_string_lossy();
    if MAIN_SEPARATOR == '\\' {
        s.replace('\\', "/")
    } else {
        s.into_owned()
    }
}

/// True if the walked entry should go to a worker: anything but a directory whose base name
/// matches and that is not one of `skip_paths`. Symlinks are not resolved here; the worker's
/// read follows them, so a dangling link fails the run as a read error.
pub fn is_candidate(entry: &walkdir::DirEntry, pattern: &NamePattern, skip_paths: &[PathBuf]) -> bool {
    if entry.file_type().is_dir() {
        return false;
    }
    if !pattern.matches_name(entry.file_name()) {
        return false;
    }
    if skip_paths.is_empty() {
        return true;
    }
    match entry.path().canonicalize() {
        Ok(canon) => !skip_paths.contains(&canon),
        Err(_) => true,
    }
}

/// True if the process is running with effective uid 0 (e.g. via sudo).
#[cfg(unix)]
pub fn running_as_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn running_as_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use walkdir::WalkDir;

    fn entries(root: &Path) -> Vec<walkdir::DirEntry> {
        WalkDir::new(root).into_iter().map(Result::unwrap).collect()
    }

    #[test]
    fn row_string_drops_leading_curdir() {
        assert_eq!(path_to_row_string(Path::new("./x.log")), "x.log");
        assert_eq!(path_to_row_string(Path::new("x.log")), "x.log");
        assert_eq!(path_to_row_string(Path::new("/abs/x.log")), "/abs/x.log");
        assert_eq!(path_to_row_string(Path::new("./sub/y.log")), "sub/y.log");
    }

    #[test]
    fn directories_never_candidates() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("match.txt")).unwrap();
        let pattern = NamePattern::glob("*.txt").unwrap();
        assert!(
            entries(dir.path())
                .iter()
                .all(|e| !is_candidate(e, &pattern, &[]))
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_candidates_without_following() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real/a.log"), "a").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real/a.log"), dir.path().join("link.log"))
            .unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling.log"))
            .unwrap();
        let pattern = NamePattern::glob("*.log").unwrap();
        let mut names: Vec<String> = entries(dir.path())
            .iter()
            .filter(|e| is_candidate(e, &pattern, &[]))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.log", "dangling.log", "link.log"]);
    }

    #[test]
    fn skip_paths_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("out.csv"), "").unwrap();
        fs::write(dir.path().join("in.csv"), "").unwrap();
        let skip = vec![dir.path().join("out.csv").canonicalize().unwrap()];
        let names: Vec<String> = entries(dir.path())
            .iter()
            .filter(|e| is_candidate(e, &NamePattern::Any, &skip))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["in.csv".to_string()]);
    }
}
