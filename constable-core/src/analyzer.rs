//! The analyzer handle: directory-walking entry point used by the bundled
//! driver.
//!
//! ```rust,ignore
//! use constable_core::prelude::*;
//!
//! let analyzer = Analyzer::new("src/...", AnalyzerConfig::default());
//! let (strings, constants) = analyzer.parse_tree()?;
//! ```
//!
//! Per-file work is read → parse → walk, dispatched to a dedicated Rayon
//! pool bounded at `max_concurrency` workers. Between files the only shared
//! mutable state is the aggregation store and the interning pool; per-file
//! read and parse failures are logged and skipped, and only a root that
//! cannot be opened at all fails the run.

use std::path::Path;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::AnalyzerConfig;
use crate::error::{ConstableError, ConstableResult};
use crate::filter::LiteralFilter;
use crate::intern::InternPool;
use crate::project::{self, DuplicateConstants, Issue};
use crate::scan::{self, FileMatcher};
use crate::store::{AggregationStore, ConstantsMap, StringsMap};
use crate::walker::LiteralWalker;

/// Suffix requesting recursive traversal: `constable src/...`.
const RECURSIVE_SUFFIX: &str = "...";

/// The analysis engine for one path.
///
/// Owns the interning pool and aggregation store, so every run is isolated
/// and nothing leaks between analyses.
pub struct Analyzer {
    path: String,
    config: AnalyzerConfig,
    filter: LiteralFilter,
    matcher: FileMatcher,
    intern: InternPool,
    store: AggregationStore,
    batching: bool,
}

impl Analyzer {
    /// Create an analyzer for `path` with the given options.
    ///
    /// Filter patterns are compiled here; invalid ones are reported as
    /// warnings and disabled.
    pub fn new(path: impl Into<String>, config: AnalyzerConfig) -> Self {
        let filter = LiteralFilter::from_config(&config);
        let matcher = FileMatcher::new(config.ignore_tests, config.ignore_file_pattern.as_deref());
        Self {
            path: path.into(),
            config,
            filter,
            matcher,
            intern: InternPool::new(),
            store: AggregationStore::new(),
            batching: false,
        }
    }

    /// Set the worker pool size. Values of zero are ignored.
    pub fn set_concurrency(&mut self, max: usize) {
        if max > 0 {
            self.config.max_concurrency = max;
        }
    }

    /// Activate batch processing for very large corpora: the file list is
    /// collected first and processed in `batch_size` chunks, capping peak
    /// memory. A batch size of zero keeps the configured default.
    pub fn enable_batching(&mut self, batch_size: usize) {
        self.batching = true;
        if batch_size > 0 {
            self.config.batch_size = batch_size;
        }
    }

    /// Walk the path and return the surviving strings and constants maps.
    ///
    /// A trailing `...` on the path requests recursive traversal. The
    /// post-pass thresholds are already applied to the returned maps.
    pub fn parse_tree(&self) -> ConstableResult<(StringsMap, ConstantsMap)> {
        let (root, recursive) = split_recursive_path(&self.path);
        let root = Path::new(root);

        let meta = std::fs::metadata(root).map_err(|e| ConstableError::io(root, e))?;

        if meta.is_file() {
            self.parse_single_file(root)?;
        } else if self.batching {
            self.walk_batched(root, recursive)?;
        } else {
            self.walk_streaming(root, recursive)?;
        }

        project::process_results(&self.store, &self.filter, self.config.min_occurrences);
        Ok((self.store.strings_map(), self.store.constants_map()))
    }

    /// Project the store into sorted issues. Meaningful after `parse_tree`.
    pub fn issues(&self) -> Vec<Issue> {
        project::project_issues(&self.store, self.config.match_constants)
    }

    /// Constants sharing a value. Meaningful after `parse_tree`.
    pub fn duplicate_constants(&self) -> Vec<DuplicateConstants> {
        project::duplicate_constants(&self.store)
    }

    /// A single named file is analyzed unconditionally, so its errors are
    /// the caller's problem rather than a logged skip.
    fn parse_single_file(&self, path: &Path) -> ConstableResult<()> {
        let source =
            std::fs::read_to_string(path).map_err(|e| ConstableError::io(path, e))?;
        let ast = syn::parse_file(&source).map_err(|e| {
            let start = e.span().start();
            ConstableError::parse_at(path, e.to_string(), start.line, start.column + 1)
        })?;
        self.walk_ast(path, &ast);
        Ok(())
    }

    /// Streaming mode: the directory walker enumerates entries while the
    /// pool's workers drain them.
    fn walk_streaming(&self, root: &Path, recursive: bool) -> ConstableResult<()> {
        let pool = self.build_pool()?;

        if !recursive {
            let files = scan::list_dir_files(root, &self.matcher)
                .map_err(|e| ConstableError::internal(e.to_string()))?;
            pool.install(|| {
                files.par_iter().for_each(|path| self.process_file(path));
            });
            return Ok(());
        }

        pool.install(|| {
            WalkDir::new(root)
                .into_iter()
                .filter_entry(|e| !self.matcher.prunes_dir(e))
                .par_bridge()
                .for_each(|entry| match entry {
                    Ok(e) => {
                        let path = e.path();
                        if path.is_file() && self.matcher.accepts_file(path) {
                            self.process_file(path);
                        }
                    }
                    Err(e) => warn!(error = %e, "skipping unreadable entry"),
                });
        });
        Ok(())
    }

    /// Batched mode: collect everything, then process fixed-size chunks so
    /// peak memory stays bounded on very large corpora.
    fn walk_batched(&self, root: &Path, recursive: bool) -> ConstableResult<()> {
        let files = if recursive {
            scan::gather_source_files(root, &self.matcher)
                .map_err(|e| ConstableError::internal(e.to_string()))?
        } else {
            scan::list_dir_files(root, &self.matcher)
                .map_err(|e| ConstableError::internal(e.to_string()))?
        };

        let batch_size = self.config.batch_size.max(1);
        let batches = files.len().div_ceil(batch_size);
        info!(files = files.len(), batch_size, "processing in batches");

        let pool = self.build_pool()?;
        for (index, batch) in files.chunks(batch_size).enumerate() {
            info!(batch = index + 1, batches, files = batch.len(), "processing batch");
            pool.install(|| {
                batch.par_iter().for_each(|path| self.process_file(path));
            });
        }
        Ok(())
    }

    /// Read, parse, and walk one file. Failures are logged and the file is
    /// skipped; the run continues.
    fn process_file(&self, path: &Path) {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unreadable file");
                return;
            }
        };

        let ast = match syn::parse_file(&source) {
            Ok(ast) => ast,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unparsable file");
                return;
            }
        };

        self.walk_ast(path, &ast);
    }

    fn walk_ast(&self, path: &Path, ast: &syn::File) {
        let file = path.display().to_string();
        let package = package_name(path);
        let mut walker = LiteralWalker::new(
            &file,
            &package,
            &self.store,
            &self.intern,
            &self.filter,
            &self.config,
            None,
        );
        walker.walk(ast);
    }

    fn build_pool(&self) -> ConstableResult<ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrency)
            .build()
            .map_err(|e| ConstableError::internal(format!("failed to build worker pool: {}", e)))
    }
}

/// Strip the trailing recursive sentinel, if present.
fn split_recursive_path(path: &str) -> (&str, bool) {
    match path.strip_suffix(RECURSIVE_SUFFIX) {
        Some(prefix) => {
            let prefix = prefix.strip_suffix('/').unwrap_or(prefix);
            let prefix = if prefix.is_empty() { "." } else { prefix };
            (prefix, true)
        }
        None => (path, false),
    }
}

/// The module name a file contributes to: its stem, the per-file analogue of
/// a package.
fn package_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
