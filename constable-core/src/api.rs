//! Library entry point over pre-parsed files.
//!
//! Lint frameworks that already hold parsed ASTs call [`run`] directly
//! instead of letting the analyzer walk the filesystem. The caller supplies
//! the file path (for positions), the package name, and optionally a
//! [`ConstValueOracle`](crate::resolve::ConstValueOracle) that can fold
//! constant expressions the internal resolver cannot (numeric arithmetic).

use rayon::prelude::*;

use crate::config::AnalyzerConfig;
use crate::error::{ConstableError, ConstableResult};
use crate::filter::LiteralFilter;
use crate::intern::InternPool;
use crate::project::{self, Issue};
use crate::resolve::ConstValueOracle;
use crate::scan::TEST_FILE_SUFFIX;
use crate::store::AggregationStore;
use crate::walker::LiteralWalker;

/// One pre-parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path used for positions in the output.
    pub path: String,
    /// Package (module) context for constant resolution.
    pub package: String,
    /// The parsed syntax tree.
    pub ast: syn::File,
}

impl ParsedFile {
    /// Parse `source`, deriving the package name from the path's file stem.
    pub fn parse(path: impl Into<String>, source: &str) -> ConstableResult<Self> {
        let path = path.into();
        let ast = syn::parse_file(source).map_err(|e| {
            let start = e.span().start();
            ConstableError::parse_at(&path, e.to_string(), start.line, start.column + 1)
        })?;
        let package = std::path::Path::new(&path)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Self { path, package, ast })
    }
}

/// Analyze pre-parsed files and return the sorted issues.
///
/// Files are walked in a pool bounded at `config.max_concurrency`; the
/// projection afterwards applies the occurrence threshold and value-level
/// filters and picks each value's matching constant.
pub fn run(
    files: &[ParsedFile],
    oracle: Option<&dyn ConstValueOracle>,
    config: &AnalyzerConfig,
) -> ConstableResult<Vec<Issue>> {
    let filter = LiteralFilter::from_config(config);
    let intern = InternPool::new();
    let store = AggregationStore::new();

    let candidates: Vec<&ParsedFile> = files
        .iter()
        .filter(|f| !(config.ignore_tests && f.path.ends_with(TEST_FILE_SUFFIX)))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_concurrency)
        .build()
        .map_err(|e| ConstableError::internal(format!("failed to build worker pool: {}", e)))?;

    pool.install(|| {
        candidates.par_iter().for_each(|file| {
            let mut walker = LiteralWalker::new(
                &file.path,
                &file.package,
                &store,
                &intern,
                &filter,
                config,
                oracle,
            );
            walker.walk(&file.ast);
        });
    });

    project::process_results(&store, &filter, config.min_occurrences);
    Ok(project::project_issues(&store, config.match_constants))
}
