//! The declarative filter state a caller assembles before asking for a query.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::error::ExplorerError;

/// Default cap on materialized rows, matching the interactive preview size.
pub const DEFAULT_ROW_LIMIT: usize = 10_000;

/// Everything that shapes one query: which columns to project, which values to
/// accept per column, the inclusive filename-date window, sampling, and the
/// row limit. The state is plain data owned by the caller; the core never
/// mutates it, and the caller is expected to recompute the fingerprint after
/// any change before consulting the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Ordered projection. Must be non-empty and a subset of the discovered
    /// schema when the query is built.
    pub selected_columns: Vec<String>,
    /// Column name to accepted literal values. A missing entry means the
    /// column is unconstrained; an entry with an empty value list is invalid
    /// and rejected at build time. Values are matched exactly as recorded:
    /// case-sensitive, no whitespace trimming.
    pub value_filters: BTreeMap<String, Vec<String>>,
    /// Inclusive bounds against the filename-derived date. Both bounds travel
    /// together; a single bound cannot be represented and produces no clause.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// When set, ask the engine for a random subset of exactly this many rows,
    /// drawn after filtering and before the row limit.
    pub sampling: Option<usize>,
    /// Cap on materialized rows, applied last and only at execution time.
    pub row_limit: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected_columns: Vec::new(),
            value_filters: BTreeMap::new(),
            date_range: None,
            sampling: None,
            row_limit: DEFAULT_ROW_LIMIT,
        }
    }
}

impl FilterState {
    pub fn new(selected_columns: Vec<String>) -> Self {
        Self {
            selected_columns,
            ..Self::default()
        }
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.selected_columns = columns;
        self
    }

    pub fn with_value_filter(mut self, column: impl Into<String>, values: Vec<String>) -> Self {
        self.value_filters.insert(column.into(), values);
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn with_sampling(mut self, rows: usize) -> Self {
        self.sampling = Some(rows);
        self
    }

    pub fn with_row_limit(mut self, row_limit: usize) -> Self {
        self.row_limit = row_limit;
        self
    }

    /// Reject any reference to a column the discovered schema does not have.
    /// Runs before query build so the engine never sees an unknown name.
    pub fn validate(&self, schema_columns: &[String]) -> Result<(), ExplorerError> {
        let known = |name: &String| schema_columns.iter().any(|c| c == name);

        if let Some(column) = self.selected_columns.iter().find(|c| !known(c)) {
            return Err(ExplorerError::SchemaMismatch {
                column: column.clone(),
            });
        }
        if let Some(column) = self.value_filters.keys().find(|c| !known(c)) {
            return Err(ExplorerError::SchemaMismatch {
                column: column.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<String> {
        vec!["id".to_string(), "region".to_string(), "amount".to_string()]
    }

    #[test]
    fn validate_accepts_known_columns() {
        let state = FilterState::new(vec!["region".to_string(), "amount".to_string()])
            .with_value_filter("region", vec!["EU".to_string()]);
        assert!(state.validate(&schema()).is_ok());
    }

    #[test]
    fn validate_rejects_unknown_projection() {
        let state = FilterState::new(vec!["region".to_string(), "ghost".to_string()]);
        match state.validate(&schema()) {
            Err(ExplorerError::SchemaMismatch { column }) => assert_eq!(column, "ghost"),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn validate_rejects_unknown_filter_column() {
        let state = FilterState::new(vec!["region".to_string()])
            .with_value_filter("ghost", vec!["x".to_string()]);
        assert!(matches!(
            state.validate(&schema()),
            Err(ExplorerError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn default_row_limit_applied() {
        let state = FilterState::new(vec!["id".to_string()]);
        assert_eq!(state.row_limit, DEFAULT_ROW_LIMIT);
        assert!(state.sampling.is_none());
        assert!(state.date_range.is_none());
    }
}
