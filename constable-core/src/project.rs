//! Result projection: the post-pass that turns raw aggregation state into
//! the reported issues.
//!
//! Runs strictly after every walker has finished. Thresholds and the
//! value-level filters are applied first, then the surviving values are
//! sorted lexicographically so output is deterministic regardless of the
//! order files were processed in.

use serde::Serialize;
use tracing::error;

use crate::filter::LiteralFilter;
use crate::literal::{Role, SourcePos};
use crate::store::{AggregationStore, ConstantDef};

/// A literal value worth turning into a constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// Position of the first occurrence (lowest file/line/column).
    pub pos: SourcePos,
    /// Total number of occurrences.
    pub count: usize,
    /// The canonical value.
    pub value: String,
    /// Name of the matching declared constant, if any.
    pub matching_const: Option<String>,
    /// Role of the first occurrence.
    pub role: Role,
}

/// A constant value declared more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateConstants {
    pub value: String,
    /// All declarations sharing the value, ordered by position.
    pub declarations: Vec<ConstantDef>,
}

/// Apply the minimum-occurrence threshold and the value-level filters,
/// dropping failing values from the store.
pub fn process_results(store: &AggregationStore, filter: &LiteralFilter, min_occurrences: usize) {
    for value in store.values() {
        if store.count(&value) < min_occurrences || !filter.permits_post(&value) {
            store.drop_value(&value);
        }
    }
}

/// Project the surviving values into issues, sorted by canonical value.
///
/// The matching constant for a value is the earliest-positioned declaration,
/// decided here and never by walker arrival order.
pub fn project_issues(store: &AggregationStore, match_constants: bool) -> Vec<Issue> {
    let mut values = store.values();
    values.sort();

    let mut issues = Vec::with_capacity(values.len());
    for value in values {
        let mut occurrences = store.occurrences(&value);
        if occurrences.is_empty() {
            continue;
        }
        occurrences.sort_by(|a, b| a.pos.cmp(&b.pos));

        let count = store.count(&value);
        if count != occurrences.len() {
            // Should not happen with the always-append store; report and
            // keep going with what we have.
            error!(
                value = %value,
                count,
                positions = occurrences.len(),
                "occurrence count disagrees with position list"
            );
        }

        let matching_const = if match_constants {
            earliest_constant(&store.constants_for(&value)).map(|d| d.name.to_string())
        } else {
            None
        };

        let first = &occurrences[0];
        issues.push(Issue {
            pos: first.pos.clone(),
            count: count.max(occurrences.len()),
            value: value.to_string(),
            matching_const,
            role: first.role,
        });
    }
    issues
}

/// Collect the values declared by two or more constants, ordered by value,
/// declarations ordered by position.
pub fn duplicate_constants(store: &AggregationStore) -> Vec<DuplicateConstants> {
    let mut values = store.constant_values();
    values.sort();

    let mut duplicates = Vec::new();
    for value in values {
        let mut declarations = store.constants_for(&value);
        if declarations.len() < 2 {
            continue;
        }
        declarations.sort_by(|a, b| a.pos.cmp(&b.pos));
        duplicates.push(DuplicateConstants {
            value: value.to_string(),
            declarations,
        });
    }
    duplicates
}

fn earliest_constant(defs: &[ConstantDef]) -> Option<&ConstantDef> {
    defs.iter().min_by(|a, b| a.pos.cmp(&b.pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::store::Occurrence;
    use std::sync::Arc;

    fn pos(file: &str, line: usize) -> SourcePos {
        SourcePos {
            file: file.to_string(),
            line,
            column: 1,
            offset: line * 10,
        }
    }

    fn add_occurrences(store: &AggregationStore, value: &str, positions: &[(&str, usize)]) {
        for (file, line) in positions {
            store.add_occurrence(
                Arc::from(value),
                Occurrence {
                    pos: pos(file, *line),
                    package: Arc::from("pkg"),
                    role: Role::Assignment,
                },
            );
        }
    }

    fn add_const(store: &AggregationStore, value: &str, name: &str, file: &str, line: usize) {
        store.add_constant(
            Arc::from(value),
            ConstantDef {
                name: Arc::from(name),
                package: Arc::from("pkg"),
                pos: pos(file, line),
            },
        );
    }

    #[test]
    fn test_threshold_drops_singletons() {
        let store = AggregationStore::new();
        add_occurrences(&store, "kept value", &[("a.rs", 1), ("a.rs", 5)]);
        add_occurrences(&store, "lone value", &[("a.rs", 9)]);

        let filter = LiteralFilter::from_config(&AnalyzerConfig::default());
        process_results(&store, &filter, 2);

        let issues = project_issues(&store, false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].value, "kept value");
        assert_eq!(issues[0].count, 2);
        assert_eq!(issues[0].matching_const, None);
    }

    #[test]
    fn test_value_level_filters_reapplied() {
        let store = AggregationStore::new();
        add_occurrences(&store, "ignored value", &[("a.rs", 1), ("a.rs", 2)]);
        add_occurrences(&store, "12345", &[("a.rs", 3), ("a.rs", 4)]);
        add_occurrences(&store, "plain value", &[("a.rs", 5), ("a.rs", 6)]);

        let mut cfg = AnalyzerConfig::default();
        cfg.ignore_patterns = vec!["^ignored".to_string()];
        cfg.number_max = 2000;
        let filter = LiteralFilter::from_config(&cfg);
        process_results(&store, &filter, 2);

        let issues = project_issues(&store, false);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].value, "plain value");
    }

    #[test]
    fn test_issues_sorted_by_value_and_position() {
        let store = AggregationStore::new();
        add_occurrences(&store, "zebra value", &[("z.rs", 4), ("a.rs", 8)]);
        add_occurrences(&store, "alpha value", &[("b.rs", 2), ("b.rs", 1)]);

        let filter = LiteralFilter::from_config(&AnalyzerConfig::default());
        process_results(&store, &filter, 2);

        let issues = project_issues(&store, false);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].value, "alpha value");
        // First occurrence is the positionally lowest, not the first seen.
        assert_eq!(issues[0].pos, pos("b.rs", 1));
        assert_eq!(issues[1].pos, pos("a.rs", 8));
    }

    #[test]
    fn test_matching_const_is_earliest_declaration() {
        let store = AggregationStore::new();
        add_occurrences(&store, "shared value", &[("use.rs", 1), ("use.rs", 2)]);
        add_const(&store, "shared value", "LATER", "decl.rs", 20);
        add_const(&store, "shared value", "EARLIER", "decl.rs", 3);

        let filter = LiteralFilter::from_config(&AnalyzerConfig::default());
        process_results(&store, &filter, 2);

        let issues = project_issues(&store, true);
        assert_eq!(issues[0].matching_const.as_deref(), Some("EARLIER"));

        // With matching disabled no annotation is computed.
        let issues = project_issues(&store, false);
        assert_eq!(issues[0].matching_const, None);
    }

    #[test]
    fn test_duplicate_constants_ordered() {
        let store = AggregationStore::new();
        add_const(&store, "shared value", "D", "b.rs", 2);
        add_const(&store, "shared value", "A", "a.rs", 1);
        add_const(&store, "shared value", "C", "a.rs", 7);
        add_const(&store, "unique value", "ONLY", "a.rs", 3);

        let dups = duplicate_constants(&store);
        assert_eq!(dups.len(), 1);
        assert_eq!(dups[0].value, "shared value");
        let names: Vec<_> = dups[0].declarations.iter().map(|d| d.name.to_string()).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
    }

    #[test]
    fn test_projection_deterministic() {
        let build = || {
            let store = AggregationStore::new();
            add_occurrences(&store, "beta value", &[("b.rs", 2), ("a.rs", 1)]);
            add_occurrences(&store, "alpha value", &[("c.rs", 3), ("c.rs", 9)]);
            let filter = LiteralFilter::from_config(&AnalyzerConfig::default());
            process_results(&store, &filter, 2);
            project_issues(&store, false)
        };
        assert_eq!(build(), build());
    }
}
