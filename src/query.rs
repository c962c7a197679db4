//! Pure construction of query text from a source location and a filter state.
//!
//! The builder never talks to the engine and never touches the filesystem;
//! for equal inputs it produces byte-equal text, which is what makes the
//! fingerprint-keyed result cache meaningful. Row limits are deliberately
//! absent from the output: the gateway appends `LIMIT` at execution time so
//! the same text can serve a preview run and a larger export run.

use crate::error::ExplorerError;
use crate::filter::FilterState;
use crate::source::{SourceLocation, DATE_TOKEN_PATTERN};
use std::path::Path;

/// Name under which the filename-derived date is projected.
pub const DATE_ATTRIBUTE: &str = "date";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Project the derived date plus the selected columns.
    Data,
    /// Project a row count only; the column selection is ignored.
    Count,
}

/// Double embedded single quotes so a literal can sit inside a quoted SQL
/// string. This is the single escaping point for every value interpolated
/// into query text: filter values, date bounds, and the scan path. The
/// engine's standard strings treat backslashes literally, so quote doubling
/// is the whole discipline.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Quote an identifier, doubling embedded double quotes.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn read_csv_clause(source: &SourceLocation, path: &str, multi_file: bool) -> String {
    let opts = &source.options;
    let mut clause = format!(
        "read_csv('{}', delim = '{}', encoding = '{}', header = {}",
        escape_literal(path),
        escape_literal(&opts.delimiter.to_string()),
        escape_literal(&opts.encoding),
        opts.has_header,
    );
    if multi_file {
        clause.push_str(", union_by_name = true, filename = true, ignore_errors = true");
    }
    clause.push(')');
    clause
}

/// Scan clause over every shard in the source: glob path, schema union by
/// column name, malformed rows skipped, and the originating filename exposed
/// as a pseudo-column for date derivation.
pub(crate) fn scan_clause(source: &SourceLocation) -> String {
    read_csv_clause(source, &source.glob(), true)
}

/// Scan clause over a single shard, used for schema discovery.
pub(crate) fn scan_one(source: &SourceLocation, shard: &Path) -> String {
    read_csv_clause(source, &shard.display().to_string(), false)
}

fn date_expr() -> String {
    format!("regexp_extract(filename, '{}', 1)", DATE_TOKEN_PATTERN)
}

/// Build the query text for the given mode.
///
/// Value lists are sorted and deduplicated before interpolation so that one
/// semantic filter state maps to exactly one text, independent of how the
/// caller ordered the values.
pub fn build_query(
    source: &SourceLocation,
    state: &FilterState,
    mode: QueryMode,
) -> Result<String, ExplorerError> {
    if mode == QueryMode::Data && state.selected_columns.is_empty() {
        return Err(ExplorerError::QueryBuild(
            "at least one column must be selected".to_string(),
        ));
    }

    let date = date_expr();
    let projection = match mode {
        QueryMode::Data => {
            let mut parts = Vec::with_capacity(state.selected_columns.len() + 1);
            parts.push(format!("{} AS {}", date, quote_ident(DATE_ATTRIBUTE)));
            parts.extend(state.selected_columns.iter().map(|c| quote_ident(c)));
            parts.join(", ")
        }
        QueryMode::Count => "count(*) AS row_count".to_string(),
    };

    let mut clauses = Vec::new();
    if let Some((start, end)) = state.date_range {
        clauses.push(format!(
            "{} BETWEEN '{}' AND '{}'",
            date,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        ));
    }
    for (column, values) in &state.value_filters {
        if values.is_empty() {
            return Err(ExplorerError::QueryBuild(format!(
                "value filter on '{column}' has an empty value set"
            )));
        }
        let mut values: Vec<&String> = values.iter().collect();
        values.sort();
        values.dedup();
        let list = values
            .iter()
            .map(|v| format!("'{}'", escape_literal(v)))
            .collect::<Vec<_>>()
            .join(", ");
        clauses.push(format!("{} IN ({})", quote_ident(column), list));
    }

    let mut sql = format!("SELECT {}\nFROM {}", projection, scan_clause(source));
    if !clauses.is_empty() {
        sql.push_str("\nWHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    if mode == QueryMode::Data {
        if let Some(rows) = state.sampling {
            // Reservoir sampling returns exactly the requested number of rows
            // (or everything, when fewer match). Placed after WHERE so the
            // subset is drawn from the filtered set, before any LIMIT the
            // gateway appends.
            sql.push_str(&format!("\nUSING SAMPLE reservoir({rows} ROWS)"));
        }
    }
    Ok(sql)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn source() -> SourceLocation {
        SourceLocation::new("/data/shards")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state(columns: &[&str]) -> FilterState {
        FilterState::new(columns.iter().map(|c| c.to_string()).collect())
    }

    /// Undo `escape_literal` the way the engine's parser would: strip outer
    /// quotes, collapse doubled quotes.
    fn unescape(quoted: &str) -> String {
        quoted
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .unwrap()
            .replace("''", "'")
    }

    #[test]
    fn escaping_round_trips() {
        for value in [
            "EU",
            "O'Brien",
            "it's ''quoted''",
            "back\\slash",
            "comma,delimiter",
            "'",
            "''",
        ] {
            let quoted = format!("'{}'", escape_literal(value));
            assert_eq!(unescape(&quoted), value, "round trip failed for {value:?}");
        }
    }

    #[test]
    fn data_projection_has_date_first() {
        let sql = build_query(&source(), &state(&["region", "amount"]), QueryMode::Data).unwrap();
        let select = sql.lines().next().unwrap();
        assert_eq!(
            select,
            "SELECT regexp_extract(filename, '(\\d{4}-\\d{2}-\\d{2})', 1) AS \"date\", \"region\", \"amount\""
        );
    }

    #[test]
    fn scan_reads_glob_with_union_and_filename() {
        let sql = build_query(&source(), &state(&["id"]), QueryMode::Data).unwrap();
        assert!(sql.contains("*.csv"));
        assert!(sql.contains("union_by_name = true"));
        assert!(sql.contains("filename = true"));
        assert!(sql.contains("ignore_errors = true"));
        assert!(sql.contains("delim = ','"));
        assert!(sql.contains("encoding = 'utf-8'"));
    }

    #[test]
    fn count_mode_ignores_selection() {
        let sql = build_query(&source(), &state(&["region"]), QueryMode::Count).unwrap();
        assert!(sql.starts_with("SELECT count(*) AS row_count"));
        assert!(!sql.contains("\"region\""));

        // Count mode tolerates an empty selection entirely.
        let sql = build_query(&source(), &state(&[]), QueryMode::Count).unwrap();
        assert!(sql.starts_with("SELECT count(*)"));
    }

    #[test]
    fn empty_selection_rejected_in_data_mode() {
        assert!(matches!(
            build_query(&source(), &state(&[]), QueryMode::Data),
            Err(ExplorerError::QueryBuild(_))
        ));
    }

    #[test]
    fn empty_value_set_rejected() {
        let st = state(&["region"]).with_value_filter("region", vec![]);
        assert!(matches!(
            build_query(&source(), &st, QueryMode::Data),
            Err(ExplorerError::QueryBuild(_))
        ));
    }

    #[test]
    fn date_range_clause_inclusive_bounds() {
        let st = state(&["id"]).with_date_range(date(2021, 1, 1), date(2021, 1, 31));
        let sql = build_query(&source(), &st, QueryMode::Data).unwrap();
        assert!(sql.contains("BETWEEN '2021-01-01' AND '2021-01-31'"));
    }

    #[test]
    fn no_date_range_no_clause() {
        let sql = build_query(&source(), &state(&["id"]), QueryMode::Data).unwrap();
        assert!(!sql.contains("BETWEEN"));
        assert!(!sql.contains("WHERE"));
    }

    #[test]
    fn value_filters_conjoined_with_and() {
        let st = state(&["id"])
            .with_value_filter("region", vec!["EU".to_string(), "US".to_string()])
            .with_value_filter("status", vec!["open".to_string()]);
        let sql = build_query(&source(), &st, QueryMode::Data).unwrap();
        assert!(sql.contains("\"region\" IN ('EU', 'US')"));
        assert!(sql.contains("\"status\" IN ('open')"));
        assert!(sql.contains(" AND "));
    }

    #[test]
    fn value_lists_sorted_and_deduplicated() {
        let st = state(&["id"]).with_value_filter(
            "region",
            vec!["US".to_string(), "EU".to_string(), "US".to_string()],
        );
        let sql = build_query(&source(), &st, QueryMode::Data).unwrap();
        assert!(sql.contains("\"region\" IN ('EU', 'US')"));
    }

    #[test]
    fn quoted_value_survives_interpolation() {
        let st = state(&["name"]).with_value_filter("name", vec!["O'Brien".to_string()]);
        let sql = build_query(&source(), &st, QueryMode::Data).unwrap();
        assert!(sql.contains("\"name\" IN ('O''Brien')"));
    }

    #[test]
    fn sampling_after_where_and_no_limit() {
        let st = state(&["id"])
            .with_value_filter("region", vec!["EU".to_string()])
            .with_sampling(100);
        let sql = build_query(&source(), &st, QueryMode::Data).unwrap();
        let where_pos = sql.find("WHERE").unwrap();
        let sample_pos = sql.find("USING SAMPLE reservoir(100 ROWS)").unwrap();
        assert!(where_pos < sample_pos);
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn sampling_absent_from_count_mode() {
        let st = state(&["id"]).with_sampling(100);
        let sql = build_query(&source(), &st, QueryMode::Count).unwrap();
        assert!(!sql.contains("USING SAMPLE"));
    }

    #[test]
    fn build_is_idempotent() {
        let st = state(&["region", "amount"])
            .with_value_filter("region", vec!["EU".to_string()])
            .with_date_range(date(2021, 1, 1), date(2021, 1, 2))
            .with_sampling(50);
        let a = build_query(&source(), &st, QueryMode::Data).unwrap();
        let b = build_query(&source(), &st, QueryMode::Data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn projection_follows_selection_order() {
        let ab = build_query(&source(), &state(&["a", "b"]), QueryMode::Data).unwrap();
        let ba = build_query(&source(), &state(&["b", "a"]), QueryMode::Data).unwrap();
        assert_ne!(ab, ba);
        assert!(ab.contains("\"a\", \"b\""));
        assert!(ba.contains("\"b\", \"a\""));
    }

    #[test]
    fn identifiers_with_quotes_are_escaped() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn scan_path_quotes_escaped() {
        let src = SourceLocation::new("/data/o'brien");
        let sql = build_query(&src, &state(&["id"]), QueryMode::Data).unwrap();
        assert!(sql.contains("o''brien"));
    }
}
