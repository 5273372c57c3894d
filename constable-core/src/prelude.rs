//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use constable_core::prelude::*;
//! ```

// Core analysis types
pub use crate::error::{ConstableError, ConstableResult};
pub use crate::literal::{Role, SourcePos};
pub use crate::store::{ConstantDef, ConstantsMap, Occurrence, StringsMap};

// Configuration
pub use crate::config::{load_config, AnalyzerConfig, FileConfig};

// Entry points
pub use crate::analyzer::Analyzer;
pub use crate::api::{run, ParsedFile};

// Projection output
pub use crate::project::{DuplicateConstants, Issue};

// Constant-expression resolution
pub use crate::resolve::ConstValueOracle;
