//! File discovery with efficient directory pruning.
//!
//! Performance characteristics:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel gathering via Rayon's `par_bridge` when collecting up front
//! - Minimal work per entry (extension and basename checks only)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Directories to exclude by default (standard Rust project conventions).
const EXCLUDED_DIRS: &[&str] = &["target", ".git", "node_modules", ".cargo"];

/// Basename suffix identifying test files.
pub const TEST_FILE_SUFFIX: &str = "_test.rs";

/// Directory holding integration tests, pruned when tests are ignored.
const TESTS_DIR: &str = "tests";

/// File-level filtering shared by every discovery mode.
#[derive(Debug, Default)]
pub struct FileMatcher {
    ignore_tests: bool,
    path_ignore: Option<Regex>,
}

impl FileMatcher {
    /// Build a matcher; an invalid path-ignore pattern is reported and
    /// disabled rather than failing the run.
    pub fn new(ignore_tests: bool, path_ignore_pattern: Option<&str>) -> Self {
        let path_ignore = path_ignore_pattern.filter(|p| !p.is_empty()).and_then(|p| {
            match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "invalid file ignore pattern, disabling it");
                    None
                }
            }
        });

        Self {
            ignore_tests,
            path_ignore,
        }
    }

    /// Whether a directory entry should be pruned from traversal.
    pub fn prunes_dir(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        if EXCLUDED_DIRS.contains(&name.as_ref()) {
            return true;
        }
        if self.ignore_tests && name == TESTS_DIR {
            return true;
        }
        self.matches_ignored_path(entry.path())
    }

    /// Whether a path is a candidate source file.
    pub fn accepts_file(&self, path: &Path) -> bool {
        if path.extension().map_or(true, |ext| ext != "rs") {
            return false;
        }
        if self.ignore_tests {
            let basename = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            if basename.ends_with(TEST_FILE_SUFFIX) {
                return false;
            }
        }
        !self.matches_ignored_path(path)
    }

    fn matches_ignored_path(&self, path: &Path) -> bool {
        match &self.path_ignore {
            Some(re) => re.is_match(&path.to_string_lossy()),
            None => false,
        }
    }
}

/// Gathers candidate .rs files recursively below `root`.
///
/// Used by the batched pipeline, which needs the complete list up front.
/// Unreadable entries are logged and skipped; the walk itself continues.
pub fn gather_source_files(root: &Path, matcher: &FileMatcher) -> Result<Vec<PathBuf>> {
    let files = WalkDir::new(root)
        .into_iter()
        // filter_entry prunes entire subtrees before iteration
        .filter_entry(|e| !matcher.prunes_dir(e))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if path.is_file() && matcher.accepts_file(path) {
                    Some(path.to_path_buf())
                } else {
                    None
                }
            }
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .collect::<Vec<_>>();
    Ok(files)
}

/// Lists candidate .rs files in the immediate directory, non-recursively.
pub fn list_dir_files(root: &Path, matcher: &FileMatcher) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(root)
        .with_context(|| format!("Failed to read directory {}", root.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && matcher.accepts_file(&path) {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("constable_scan_{}_{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(dir.join("src")).unwrap();
        dir
    }

    #[test]
    fn test_gather_recursive_prunes_excluded_dirs() {
        let dir = setup("prune");
        fs::write(dir.join("src/lib.rs"), "fn a() {}").unwrap();
        fs::create_dir_all(dir.join("target/debug")).unwrap();
        fs::write(dir.join("target/debug/gen.rs"), "fn b() {}").unwrap();

        let matcher = FileMatcher::new(false, None);
        let files = gather_source_files(&dir, &matcher).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/lib.rs"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_ignore_tests_suffix_and_dir() {
        let dir = setup("tests");
        fs::write(dir.join("src/lib.rs"), "fn a() {}").unwrap();
        fs::write(dir.join("src/lib_test.rs"), "fn t() {}").unwrap();
        fs::create_dir_all(dir.join("tests")).unwrap();
        fs::write(dir.join("tests/integration.rs"), "fn t() {}").unwrap();

        let matcher = FileMatcher::new(true, None);
        let files = gather_source_files(&dir, &matcher).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/lib.rs"));

        let matcher = FileMatcher::new(false, None);
        let files = gather_source_files(&dir, &matcher).unwrap();
        assert_eq!(files.len(), 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_path_ignore_pattern() {
        let dir = setup("ignore");
        fs::write(dir.join("src/lib.rs"), "fn a() {}").unwrap();
        fs::write(dir.join("src/generated.rs"), "fn g() {}").unwrap();

        let matcher = FileMatcher::new(false, Some("generated"));
        let files = gather_source_files(&dir, &matcher).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/lib.rs"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_pattern_disabled() {
        let dir = setup("badpattern");
        fs::write(dir.join("src/lib.rs"), "fn a() {}").unwrap();

        let matcher = FileMatcher::new(false, Some("[unclosed"));
        let files = gather_source_files(&dir, &matcher).unwrap();
        assert_eq!(files.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_non_rs_files_skipped() {
        let dir = setup("ext");
        fs::write(dir.join("src/lib.rs"), "fn a() {}").unwrap();
        fs::write(dir.join("src/notes.md"), "# notes").unwrap();
        fs::write(dir.join("src/noext"), "data").unwrap();

        let matcher = FileMatcher::new(false, None);
        let files = gather_source_files(&dir, &matcher).unwrap();
        assert_eq!(files.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_list_dir_non_recursive() {
        let dir = setup("flat");
        fs::write(dir.join("top.rs"), "fn a() {}").unwrap();
        fs::write(dir.join("src/nested.rs"), "fn b() {}").unwrap();

        let matcher = FileMatcher::new(false, None);
        let files = list_dir_files(&dir, &matcher).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("top.rs"));

        fs::remove_dir_all(&dir).ok();
    }
}
