//! String interning pool.
//!
//! The aggregation store keys on literal values, and every occurrence carries
//! its package name; in a large corpus the same handful of strings repeats
//! tens of thousands of times. The pool canonicalizes them so that equal
//! strings share one allocation.
//!
//! The pool is owned by the analyzer handle rather than being process-global,
//! so test isolation is trivial and `reset()` only exists as an explicit
//! convenience.

use std::sync::Arc;

use dashmap::DashMap;

/// Strings shorter than this are cheaper to clone than to canonicalize.
const MIN_INTERN_LEN: usize = 2;

/// A concurrent content-keyed interning pool.
///
/// `intern(x) == intern(y)` exactly when `x == y` as byte sequences; for
/// strings long enough to pool, equal inputs also share storage.
#[derive(Debug, Default)]
pub struct InternPool {
    strings: DashMap<Arc<str>, ()>,
}

impl InternPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical reference for `s`. Idempotent; short and empty
    /// strings bypass the pool entirely.
    pub fn intern(&self, s: &str) -> Arc<str> {
        if s.len() < MIN_INTERN_LEN {
            return Arc::from(s);
        }

        if let Some(existing) = self.strings.get(s) {
            return existing.key().clone();
        }

        // entry() locks the shard, so a racing insert still yields one
        // canonical key for everyone.
        let stored = self.strings.entry(Arc::from(s)).or_insert(());
        stored.key().clone()
    }

    /// Number of distinct pooled strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Drop all pooled strings. Outstanding `Arc`s stay valid.
    pub fn reset(&self) {
        self.strings.clear();
    }
}
