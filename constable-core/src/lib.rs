//! constable-core: repeated-literal detection library for Rust source.
//!
//! Finds string and numeric literals repeated often enough to warrant a
//! named constant, reports when a repeated literal already matches a
//! declared constant, and flags constants sharing a value.
//!
//! # Features
//!
//! - **Context classification**: literals are labeled by role (assignment,
//!   equality comparison, match arm, return, call argument)
//! - **Constant matching**: repeated literals are annotated with the name of
//!   an existing constant holding the same value
//! - **Constant-expression resolution**: `PREFIX + "api"` and
//!   `concat!(PREFIX, "api")` declaration values fold to their canonical
//!   string when evaluation is enabled
//! - **Duplicate-constant detection**: constants sharing a value are
//!   reported together, ordered by position
//! - **Parallel pipeline**: bounded worker pool over discovered files, with
//!   an optional batched mode for very large corpora
//! - **Interned aggregation**: repeated values and package names share
//!   storage across occurrences
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use constable_core::prelude::*;
//!
//! let mut config = AnalyzerConfig::default();
//! config.match_constants = true;
//!
//! let analyzer = Analyzer::new("src/...", config);
//! let (strings, constants) = analyzer.parse_tree()?;
//! for issue in analyzer.issues() {
//!     println!("{}: {} x{}", issue.pos, issue.value, issue.count);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`analyzer`]: the path-oriented engine (discovery, pipeline, batching)
//! - [`api`]: the pre-parsed-files entry point for lint frameworks
//! - [`walker`]: AST visitor and literal-context classifier
//! - [`store`]: concurrent occurrence/constant aggregation
//! - [`project`]: thresholding, sorting, and issue emission
//! - [`resolve`]: best-effort constant-expression resolution
//! - [`filter`]: the fixed predicate battery
//! - [`intern`]: content-keyed string interning
//! - [`scan`]: file discovery and filtering
//! - [`config`]: the options bundle and constable.toml loading
//! - [`error`]: typed error handling

pub mod analyzer;
pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod intern;
pub mod literal;
pub mod logging;
pub mod prelude;
pub mod project;
pub mod resolve;
pub mod scan;
pub mod store;
pub mod walker;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{ConstableError, ConstableResult, IoResultExt};

// Entry points
pub use analyzer::Analyzer;
pub use api::{run, ParsedFile};

// Configuration
pub use config::{default_concurrency, load_config, parse_roles, AnalyzerConfig, FileConfig};

// Core data model
pub use literal::{normalize_literal, parse_integer, LiteralKind, Role, SourcePos};
pub use store::{AggregationStore, ConstantDef, ConstantsMap, Occurrence, StringsMap};

// Filtering and interning
pub use filter::LiteralFilter;
pub use intern::InternPool;

// Walking and resolution
pub use resolve::{resolve_const_expr, ConstValueOracle};
pub use walker::LiteralWalker;

// Projection
pub use project::{duplicate_constants, process_results, project_issues, DuplicateConstants, Issue};

// File discovery
pub use scan::{gather_source_files, list_dir_files, FileMatcher, TEST_FILE_SUFFIX};

// Logging
pub use logging::init_structured_logging;
