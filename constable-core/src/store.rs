//! Concurrent aggregation store.
//!
//! Three maps keyed by the interned canonical value: occurrence lists,
//! occurrence counts, and constant declarations. Workers from the file
//! pipeline write under per-map write locks; reads happen after the walk
//! phase, so a consistent cross-map snapshot is only needed then.
//!
//! Every `add_occurrence` both increments the count and appends the
//! occurrence. An earlier edition of this engine kept counts only until a
//! value crossed the reporting threshold and materialized positions lazily;
//! that gate races with the threshold crossing and loses occurrences, so the
//! store always appends.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::literal::{Role, SourcePos};

/// A single appearance of a literal at one source position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(flatten)]
    pub pos: SourcePos,
    pub package: Arc<str>,
    pub role: Role,
}

/// One declared constant whose value resolved to a canonical string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstantDef {
    pub name: Arc<str>,
    pub package: Arc<str>,
    #[serde(flatten)]
    pub pos: SourcePos,
}

/// Canonical value -> occurrences, ordered for deterministic output.
pub type StringsMap = BTreeMap<String, Vec<Occurrence>>;

/// Canonical value -> declaring constants, ordered for deterministic output.
pub type ConstantsMap = BTreeMap<String, Vec<ConstantDef>>;

/// The shared mutable state of one analysis run.
#[derive(Debug, Default)]
pub struct AggregationStore {
    occurrences: RwLock<HashMap<Arc<str>, Vec<Occurrence>>>,
    counts: RwLock<HashMap<Arc<str>, usize>>,
    constants: RwLock<HashMap<Arc<str>, Vec<ConstantDef>>>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence: increment the count and append the position.
    /// Returns the new count.
    pub fn add_occurrence(&self, value: Arc<str>, occurrence: Occurrence) -> usize {
        let count = {
            let mut counts = self.counts.write().unwrap_or_else(PoisonError::into_inner);
            let slot = counts.entry(value.clone()).or_insert(0);
            *slot += 1;
            *slot
        };

        let mut occurrences = self.occurrences.write().unwrap_or_else(PoisonError::into_inner);
        occurrences.entry(value).or_default().push(occurrence);
        count
    }

    /// Record a constant declaration for its resolved value.
    ///
    /// All declarations sharing a value are retained; which one annotates a
    /// literal (the lowest-positioned) is decided in projection, never by
    /// arrival order.
    pub fn add_constant(&self, value: Arc<str>, def: ConstantDef) {
        let mut constants = self.constants.write().unwrap_or_else(PoisonError::into_inner);
        constants.entry(value).or_default().push(def);
    }

    pub fn count(&self, value: &str) -> usize {
        self.counts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(value)
            .copied()
            .unwrap_or(0)
    }

    pub fn occurrences(&self, value: &str) -> Vec<Occurrence> {
        self.occurrences
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(value)
            .cloned()
            .unwrap_or_default()
    }

    pub fn constants_for(&self, value: &str) -> Vec<ConstantDef> {
        self.constants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(value)
            .cloned()
            .unwrap_or_default()
    }

    /// Look up a constant by name within a package, returning its value.
    /// Used by the constant-expression resolver for identifier references.
    pub fn lookup_constant(&self, name: &str, package: &str) -> Option<Arc<str>> {
        let constants = self.constants.read().unwrap_or_else(PoisonError::into_inner);
        for (value, defs) in constants.iter() {
            if defs
                .iter()
                .any(|d| &*d.name == name && &*d.package == package)
            {
                return Some(value.clone());
            }
        }
        None
    }

    /// All literal values currently tracked.
    pub fn values(&self) -> Vec<Arc<str>> {
        self.occurrences
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// All values with at least one constant declaration.
    pub fn constant_values(&self) -> Vec<Arc<str>> {
        self.constants
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Remove a value from all three maps. Used by the post-pass when a
    /// value fails the threshold or the value-level filters.
    pub fn drop_value(&self, value: &str) {
        self.occurrences
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(value);
        self.counts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(value);
        self.constants
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(value);
    }

    /// Export the surviving occurrences, each list sorted by position so the
    /// output is independent of file-arrival order.
    pub fn strings_map(&self) -> StringsMap {
        let occurrences = self.occurrences.read().unwrap_or_else(PoisonError::into_inner);
        occurrences
            .iter()
            .map(|(value, occs)| {
                let mut occs = occs.clone();
                occs.sort_by(|a, b| a.pos.cmp(&b.pos));
                (value.to_string(), occs)
            })
            .collect()
    }

    /// Export the recorded constants, each list sorted by position.
    pub fn constants_map(&self) -> ConstantsMap {
        let constants = self.constants.read().unwrap_or_else(PoisonError::into_inner);
        constants
            .iter()
            .map(|(value, defs)| {
                let mut defs = defs.clone();
                defs.sort_by(|a, b| a.pos.cmp(&b.pos));
                (value.to_string(), defs)
            })
            .collect()
    }
}
