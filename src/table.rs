//! Owned tabular results: ordered column names plus rows of engine values.

use duckdb::types::{TimeUnit, Value};

/// A complete, bounded result set as returned by the execution gateway.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Render a cell for display or text export. Nulls render empty; dates and
/// timestamps render in ISO form; anything exotic falls back to its debug
/// representation.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(b) => b.to_string(),
        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::HugeInt(v) => v.to_string(),
        Value::UTinyInt(v) => v.to_string(),
        Value::USmallInt(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::UBigInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Decimal(d) => d.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => String::from_utf8_lossy(b).into_owned(),
        Value::Date32(days) => match chrono::DateTime::from_timestamp(i64::from(*days) * 86_400, 0)
        {
            Some(ts) => ts.date_naive().to_string(),
            None => days.to_string(),
        },
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => *v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            match chrono::DateTime::from_timestamp_micros(micros) {
                Some(ts) => ts.naive_utc().to_string(),
                None => v.to_string(),
            }
        }
        other => format!("{other:?}"),
    }
}
