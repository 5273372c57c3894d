//! Configuration: the immutable options bundle and constable.toml loading.

use std::collections::HashSet;
use std::path::Path;
use std::{fs, thread};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::literal::Role;

/// Default minimum canonical-value length for reporting.
pub const DEFAULT_MIN_LENGTH: usize = 3;

/// Default minimum occurrence count for reporting.
pub const DEFAULT_MIN_OCCURRENCES: usize = 2;

/// Default batch size when batch processing is enabled.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// The complete recognized option set for one analysis run.
///
/// Built once, then treated as immutable by the pipeline.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Minimum canonical-value length for literals.
    pub min_length: usize,
    /// Minimum occurrence count to report.
    pub min_occurrences: usize,
    /// Include integer and float literals.
    pub parse_numbers: bool,
    /// Inclusive lower bound on parsed integer values (0 disables).
    pub number_min: i64,
    /// Inclusive upper bound on parsed integer values (0 disables).
    pub number_max: i64,
    /// Annotate issues with matching constant names.
    pub match_constants: bool,
    /// Report constants sharing a value.
    pub find_duplicate_constants: bool,
    /// Resolve constant-expression declaration values.
    pub eval_const_expressions: bool,
    /// Regular expressions excluding string values.
    pub ignore_patterns: Vec<String>,
    /// Regular expression excluding files by full path.
    pub ignore_file_pattern: Option<String>,
    /// Exclude test files (`*_test.rs` basenames, `tests/` directories).
    pub ignore_tests: bool,
    /// Occurrence roles to skip entirely.
    pub exclude_roles: HashSet<Role>,
    /// Worker pool size. Defaults to the hardware thread count.
    pub max_concurrency: usize,
    /// Files per batch when batching is enabled.
    pub batch_size: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_LENGTH,
            min_occurrences: DEFAULT_MIN_OCCURRENCES,
            parse_numbers: false,
            number_min: 0,
            number_max: 0,
            match_constants: false,
            find_duplicate_constants: false,
            eval_const_expressions: false,
            ignore_patterns: Vec::new(),
            ignore_file_pattern: None,
            ignore_tests: true,
            exclude_roles: HashSet::new(),
            max_concurrency: default_concurrency(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl AnalyzerConfig {
    /// Whether constant declarations need to be collected at all.
    pub fn tracks_constants(&self) -> bool {
        self.match_constants || self.find_duplicate_constants
    }

    /// Overlay values from a loaded constable.toml. Settings absent from the
    /// file keep their current value.
    pub fn merge_file(mut self, file: FileConfig) -> Self {
        if let Some(v) = file.min_length {
            self.min_length = v;
        }
        if let Some(v) = file.min_occurrences {
            self.min_occurrences = v;
        }
        if let Some(v) = file.numbers {
            self.parse_numbers = v;
        }
        if let Some(v) = file.number_min {
            self.number_min = v;
        }
        if let Some(v) = file.number_max {
            self.number_max = v;
        }
        if let Some(v) = file.match_constants {
            self.match_constants = v;
        }
        if let Some(v) = file.find_duplicates {
            self.find_duplicate_constants = v;
        }
        if let Some(v) = file.eval_const_expressions {
            self.eval_const_expressions = v;
        }
        if let Some(v) = file.ignore_strings {
            self.ignore_patterns = v;
        }
        if let Some(v) = file.ignore_files {
            self.ignore_file_pattern = Some(v);
        }
        if let Some(v) = file.ignore_tests {
            self.ignore_tests = v;
        }
        if let Some(roles) = file.exclude_roles {
            self.exclude_roles = parse_roles(&roles);
        }
        if let Some(v) = file.concurrency {
            if v > 0 {
                self.max_concurrency = v;
            }
        }
        if let Some(v) = file.batch_size {
            if v > 0 {
                self.batch_size = v;
            }
        }
        self
    }
}

/// Hardware thread count, falling back to 1 when it cannot be determined.
pub fn default_concurrency() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// Parse role names, dropping unknown ones with a warning.
pub fn parse_roles(names: &[String]) -> HashSet<Role> {
    let mut roles = HashSet::new();
    for name in names {
        match name.parse::<Role>() {
            Ok(role) => {
                roles.insert(role);
            }
            Err(e) => tracing::warn!(role = %name, "{}", e),
        }
    }
    roles
}

/// Options recognized in constable.toml. All optional; anything missing
/// falls back to the defaults (or the caller's flags).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub min_length: Option<usize>,
    pub min_occurrences: Option<usize>,
    pub numbers: Option<bool>,
    pub number_min: Option<i64>,
    pub number_max: Option<i64>,
    pub match_constants: Option<bool>,
    pub find_duplicates: Option<bool>,
    pub eval_const_expressions: Option<bool>,
    pub ignore_strings: Option<Vec<String>>,
    pub ignore_files: Option<String>,
    pub ignore_tests: Option<bool>,
    pub exclude_roles: Option<Vec<String>>,
    pub concurrency: Option<usize>,
    pub batch_size: Option<usize>,
}

/// Loads configuration from constable.toml if it exists under `root`.
pub fn load_config(root: &Path) -> Result<Option<FileConfig>> {
    let path = root.join("constable.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path)?;
    let cfg = toml::from_str(&content).context("Invalid constable.toml")?;
    Ok(Some(cfg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AnalyzerConfig::default();
        assert_eq!(cfg.min_length, 3);
        assert_eq!(cfg.min_occurrences, 2);
        assert!(cfg.ignore_tests);
        assert!(!cfg.parse_numbers);
        assert!(cfg.max_concurrency >= 1);
        assert!(!cfg.tracks_constants());
    }

    #[test]
    fn test_tracks_constants() {
        let mut cfg = AnalyzerConfig::default();
        cfg.find_duplicate_constants = true;
        assert!(cfg.tracks_constants());
    }

    #[test]
    fn test_parse_roles_drops_unknown() {
        let roles = parse_roles(&["call".to_string(), "bogus".to_string(), "Binary".to_string()]);
        assert_eq!(roles.len(), 2);
        assert!(roles.contains(&Role::Call));
        assert!(roles.contains(&Role::Binary));
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = std::env::temp_dir().join(format!("constable_config_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let result = load_config(&dir);
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_merge() {
        let dir = std::env::temp_dir().join(format!("constable_config_merge_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("constable.toml"),
            r#"
min_occurrences = 5
numbers = true
ignore_strings = ["^test"]
exclude_roles = ["call", "return"]
"#,
        )
        .unwrap();

        let file = load_config(&dir).unwrap().unwrap();
        let cfg = AnalyzerConfig::default().merge_file(file);
        assert_eq!(cfg.min_occurrences, 5);
        assert!(cfg.parse_numbers);
        assert_eq!(cfg.ignore_patterns, vec!["^test".to_string()]);
        assert_eq!(cfg.exclude_roles.len(), 2);
        // Untouched settings keep their defaults.
        assert_eq!(cfg.min_length, 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir =
            std::env::temp_dir().join(format!("constable_config_invalid_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("constable.toml"), "not valid toml {{{").unwrap();

        let result = load_config(&dir);
        assert!(result.is_err());

        fs::remove_dir_all(&dir).ok();
    }
}
