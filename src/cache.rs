//! Single-slot cache for the most recent execution result.
//!
//! The cache never triggers execution. It only reports whether its contents
//! still correspond to the caller's current fingerprint; re-running is a
//! separate, explicit decision, so several filter changes can be made before
//! paying for a scan.

use crate::fingerprint::Fingerprint;
use crate::table::Table;

/// One cached execution: the fingerprint that produced it, the query text as
/// built (without the limit the gateway appended), and the result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: Fingerprint,
    pub query: String,
    pub table: Table,
}

#[derive(Debug, Default)]
pub struct ResultCache {
    entry: Option<CacheEntry>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&CacheEntry> {
        self.entry.as_ref()
    }

    /// Replace the slot wholesale. The previous entry is discarded in full.
    pub fn put(&mut self, fingerprint: Fingerprint, query: String, table: Table) -> &CacheEntry {
        self.entry.insert(CacheEntry {
            fingerprint,
            query,
            table,
        })
    }

    /// Clear to empty, as on an explicit "clear filters" action.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// True when empty or when the stored fingerprint differs from `current`.
    pub fn is_stale(&self, current: Fingerprint) -> bool {
        match &self.entry {
            Some(entry) => entry.fingerprint != current,
            None => true,
        }
    }
}
