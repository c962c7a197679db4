//! The one mutable handle an owning layer holds: source, discovered schema,
//! engine connection, and the single-slot result cache, wired together.
//!
//! Staleness detection and execution are decoupled on purpose. `is_stale`
//! only reports; nothing runs until the caller invokes `run`, so a user can
//! adjust several filters before paying for a scan. A fresh `Explorer` has an
//! empty cache, which reports stale for every fingerprint; an owning layer
//! that wants first-load data simply triggers `run` once.

use tracing::{debug, warn};

use crate::cache::{CacheEntry, ResultCache};
use crate::engine::Engine;
use crate::error::ExplorerError;
use crate::filter::FilterState;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::query::{self, build_query, QueryMode};
use crate::schema::{self, SchemaInfo};
use crate::source::SourceLocation;
use crate::table::{render_value, Table};

/// Cap on values returned by the distinct-values helper.
pub const DISTINCT_VALUE_CAP: usize = 1_000;

pub struct Explorer {
    source: SourceLocation,
    schema: SchemaInfo,
    engine: Engine,
    cache: ResultCache,
}

impl Explorer {
    /// Open a source: create the engine connection and discover the schema.
    /// Fails with `SourceUnavailable` before anything else can happen when
    /// the directory is missing, empty, or unparseable.
    pub fn open(source: SourceLocation) -> Result<Self, ExplorerError> {
        Self::open_with(source, schema::PREVIEW_ROWS)
    }

    /// Open with a custom preview size.
    pub fn open_with(source: SourceLocation, preview_rows: usize) -> Result<Self, ExplorerError> {
        let mut engine = Engine::new()?;
        let schema = schema::discover(&mut engine, &source, preview_rows)?;
        debug!(
            columns = schema.columns.len(),
            dir = %source.dir().display(),
            "opened shard source"
        );
        Ok(Self {
            source,
            schema,
            engine,
            cache: ResultCache::new(),
        })
    }

    pub fn source(&self) -> &SourceLocation {
        &self.source
    }

    pub fn schema(&self) -> &SchemaInfo {
        &self.schema
    }

    /// The current cache entry, if any, for display or export handover.
    pub fn cached(&self) -> Option<&CacheEntry> {
        self.cache.get()
    }

    pub fn fingerprint(&self, state: &FilterState) -> Fingerprint {
        fingerprint(&self.source, state)
    }

    /// Whether the cached result (if any) still matches this state.
    pub fn is_stale(&self, state: &FilterState) -> bool {
        self.cache.is_stale(self.fingerprint(state))
    }

    /// Validate the state against the discovered schema and build query text.
    /// Unknown columns are rejected here, before the engine ever sees them.
    pub fn build(&self, state: &FilterState, mode: QueryMode) -> Result<String, ExplorerError> {
        state.validate(&self.schema.columns)?;
        build_query(&self.source, state, mode)
    }

    /// The explicit execution trigger. Builds, runs, and replaces the cache
    /// entry on success. On failure the previous entry is left untouched:
    /// stale-but-valid beats empty.
    pub fn run(&mut self, state: &FilterState) -> Result<&CacheEntry, ExplorerError> {
        let current = self.fingerprint(state);
        let query = self.build(state, QueryMode::Data)?;
        let table = self.engine.execute(&query, state.row_limit)?;
        debug!(fingerprint = %current, rows = table.num_rows(), "replacing cached result");
        Ok(self.cache.put(current, query, table))
    }

    /// Re-run the cached query text with a different limit, leaving the
    /// cache untouched. Used for exports larger than the preview.
    pub fn rerun_cached(&mut self, row_limit: usize) -> Result<Table, ExplorerError> {
        let query = match self.cache.get() {
            Some(entry) => entry.query.clone(),
            None => {
                return Err(ExplorerError::QueryBuild(
                    "no cached query to re-run".to_string(),
                ))
            }
        };
        self.engine.execute(&query, row_limit)
    }

    /// Advisory row count for the current filters. Never fails: any problem
    /// degrades to `None` ("unknown").
    pub fn probe_row_count(&mut self, state: &FilterState) -> Option<u64> {
        let query = match self.build(state, QueryMode::Count) {
            Ok(query) => query,
            Err(err) => {
                warn!(%err, "row count probe could not build its query");
                return None;
            }
        };
        match self.engine.count(&query) {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(%err, "row count probe failed");
                None
            }
        }
    }

    /// Up to [`DISTINCT_VALUE_CAP`] distinct non-null values of a column,
    /// sorted, for building filters. Advisory like the probe.
    pub fn distinct_values(&mut self, column: &str) -> Option<Vec<String>> {
        if !self.schema.columns.iter().any(|c| c == column) {
            warn!(column, "distinct values requested for unknown column");
            return None;
        }
        let ident = query::quote_ident(column);
        let sql = format!(
            "SELECT DISTINCT {ident}\nFROM {}\nWHERE {ident} IS NOT NULL\nORDER BY {ident}",
            query::scan_clause(&self.source),
        );
        match self.engine.execute(&sql, DISTINCT_VALUE_CAP) {
            Ok(table) => Some(
                table
                    .rows
                    .iter()
                    .filter_map(|row| row.first())
                    .map(render_value)
                    .collect(),
            ),
            Err(err) => {
                warn!(column, %err, "distinct values unavailable");
                None
            }
        }
    }

    /// Explicit "clear filters" action: drop the cached result entirely.
    pub fn clear_results(&mut self) {
        self.cache.invalidate();
    }
}
