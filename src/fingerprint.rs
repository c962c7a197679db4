//! Deterministic fingerprinting of a filter configuration.
//!
//! The fingerprint is the sole cache key: two field-wise equal configurations
//! must hash equal, and internal representation noise (the order values were
//! added to a filter) must be invisible. `DefaultHasher` uses fixed keys, so
//! the value is stable across runs as well as within one.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::filter::FilterState;
use crate::source::SourceLocation;

/// Opaque comparable token identifying one effective configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Hash every field that changes what a query would return: the source
/// location and scan options, the projection in order, each value filter with
/// its values in sorted order, the date range, sampling, and the row limit.
pub fn fingerprint(source: &SourceLocation, state: &FilterState) -> Fingerprint {
    let mut hasher = DefaultHasher::new();

    source.dir().hash(&mut hasher);
    source.options.delimiter.hash(&mut hasher);
    source.options.encoding.hash(&mut hasher);
    source.options.has_header.hash(&mut hasher);

    state.selected_columns.hash(&mut hasher);

    state.value_filters.len().hash(&mut hasher);
    for (column, values) in &state.value_filters {
        column.hash(&mut hasher);
        let mut values: Vec<&String> = values.iter().collect();
        values.sort();
        values.dedup();
        values.hash(&mut hasher);
    }

    state.date_range.hash(&mut hasher);
    state.sampling.hash(&mut hasher);
    state.row_limit.hash(&mut hasher);

    Fingerprint(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScanOptions;
    use chrono::NaiveDate;

    fn source() -> SourceLocation {
        SourceLocation::new("/data/shards")
    }

    fn base_state() -> FilterState {
        FilterState::new(vec!["region".to_string(), "amount".to_string()])
    }

    #[test]
    fn equal_states_hash_equal() {
        assert_eq!(
            fingerprint(&source(), &base_state()),
            fingerprint(&source(), &base_state())
        );
    }

    #[test]
    fn value_order_is_invisible() {
        let a = base_state().with_value_filter(
            "region",
            vec!["EU".to_string(), "US".to_string(), "APAC".to_string()],
        );
        let b = base_state().with_value_filter(
            "region",
            vec!["US".to_string(), "APAC".to_string(), "EU".to_string()],
        );
        assert_eq!(fingerprint(&source(), &a), fingerprint(&source(), &b));
    }

    #[test]
    fn duplicate_values_are_invisible() {
        let a = base_state().with_value_filter("region", vec!["EU".to_string()]);
        let b = base_state().with_value_filter("region", vec!["EU".to_string(), "EU".to_string()]);
        assert_eq!(fingerprint(&source(), &a), fingerprint(&source(), &b));
    }

    #[test]
    fn row_limit_changes_fingerprint() {
        let a = base_state();
        let b = base_state().with_row_limit(a.row_limit + 1);
        assert_ne!(fingerprint(&source(), &a), fingerprint(&source(), &b));
    }

    #[test]
    fn column_order_changes_fingerprint() {
        let a = FilterState::new(vec!["region".to_string(), "amount".to_string()]);
        let b = FilterState::new(vec!["amount".to_string(), "region".to_string()]);
        assert_ne!(fingerprint(&source(), &a), fingerprint(&source(), &b));
    }

    #[test]
    fn date_range_changes_fingerprint() {
        let start = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2021, 1, 31).unwrap();
        let a = base_state();
        let b = base_state().with_date_range(start, end);
        assert_ne!(fingerprint(&source(), &a), fingerprint(&source(), &b));
    }

    #[test]
    fn sampling_changes_fingerprint() {
        let a = base_state();
        let b = base_state().with_sampling(100);
        let c = base_state().with_sampling(200);
        assert_ne!(fingerprint(&source(), &a), fingerprint(&source(), &b));
        assert_ne!(fingerprint(&source(), &b), fingerprint(&source(), &c));
    }

    #[test]
    fn source_location_changes_fingerprint() {
        let a = SourceLocation::new("/data/shards");
        let b = SourceLocation::new("/data/other");
        let c = SourceLocation::with_options(
            "/data/shards",
            ScanOptions::default().with_delimiter(';'),
        );
        let state = base_state();
        assert_ne!(fingerprint(&a, &state), fingerprint(&b, &state));
        assert_ne!(fingerprint(&a, &state), fingerprint(&c, &state));
    }

    #[test]
    fn filter_on_different_column_changes_fingerprint() {
        let a = base_state().with_value_filter("region", vec!["EU".to_string()]);
        let b = base_state().with_value_filter("amount", vec!["EU".to_string()]);
        assert_ne!(fingerprint(&source(), &a), fingerprint(&source(), &b));
    }
}
