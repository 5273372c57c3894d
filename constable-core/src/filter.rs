//! Candidate-occurrence filtering.
//!
//! A fixed battery of yes/no predicates applied to each candidate before it
//! reaches the aggregation store, ordered so the cheap checks short-circuit
//! first: role exclusion, then minimum length, then ignore patterns, then the
//! numeric range.
//!
//! Invalid ignore patterns are reported as configuration warnings at build
//! time and the offending pattern becomes a no-op; a bad pattern never fails
//! the run.

use std::collections::HashSet;

use regex::Regex;
use tracing::warn;

use crate::config::AnalyzerConfig;
use crate::literal::{parse_integer, Role};

/// Compiled filter predicates for one analysis run.
#[derive(Debug, Default)]
pub struct LiteralFilter {
    min_length: usize,
    number_min: i64,
    number_max: i64,
    ignore_patterns: Vec<Regex>,
    exclude_roles: HashSet<Role>,
}

impl LiteralFilter {
    /// Compile the filter set from a configuration bundle.
    ///
    /// Patterns that fail to compile are dropped with a warning.
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let mut ignore_patterns = Vec::with_capacity(config.ignore_patterns.len());
        for pattern in &config.ignore_patterns {
            if pattern.is_empty() {
                continue;
            }
            match Regex::new(pattern) {
                Ok(re) => ignore_patterns.push(re),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "invalid ignore pattern, disabling it");
                }
            }
        }

        Self {
            min_length: config.min_length,
            number_min: config.number_min,
            number_max: config.number_max,
            ignore_patterns,
            exclude_roles: config.exclude_roles.clone(),
        }
    }

    /// Whether the role itself is excluded from analysis.
    pub fn excludes_role(&self, role: Role) -> bool {
        self.exclude_roles.contains(&role)
    }

    /// Full pre-aggregation check for an occurrence, in the fixed order.
    pub fn permits(&self, value: &str, role: Role) -> bool {
        if self.excludes_role(role) {
            return false;
        }
        if value.len() < self.min_length {
            return false;
        }
        if self.matches_ignore_pattern(value) {
            return false;
        }
        self.within_number_range(value)
    }

    /// Check applied to constant declaration values: length and ignore
    /// patterns only. Constants have no role and are not range-filtered.
    pub fn permits_constant(&self, value: &str) -> bool {
        value.len() >= self.min_length && !self.matches_ignore_pattern(value)
    }

    /// Value-level re-check used by the post-pass: ignore patterns and the
    /// numeric range, without the length or role gates.
    pub fn permits_post(&self, value: &str) -> bool {
        !self.matches_ignore_pattern(value) && self.within_number_range(value)
    }

    fn matches_ignore_pattern(&self, value: &str) -> bool {
        self.ignore_patterns.iter().any(|re| re.is_match(value))
    }

    /// A configured bound of zero disables that bound. Applies only when the
    /// value parses as an integer; strings and floats pass through.
    fn within_number_range(&self, value: &str) -> bool {
        if self.number_min == 0 && self.number_max == 0 {
            return true;
        }
        match parse_integer(value) {
            Some(n) => {
                !((self.number_min != 0 && n < self.number_min)
                    || (self.number_max != 0 && n > self.number_max))
            }
            None => true,
        }
    }
}
