//! Encode a cached result for download: CSV, a JSON array of objects, or
//! newline-delimited JSON.

use clap::ValueEnum;
use color_eyre::Result;
use duckdb::types::Value;
use std::io::Write;

use crate::table::{render_value, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
    Ndjson,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Ndjson];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Ndjson => "ndjson",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write the whole table to `out` in the chosen format.
pub fn write_table<W: Write>(table: &Table, format: ExportFormat, out: &mut W) -> Result<()> {
    match format {
        ExportFormat::Csv => write_csv(table, out),
        ExportFormat::Json => write_json(table, out),
        ExportFormat::Ndjson => write_ndjson(table, out),
    }
}

fn csv_field(text: &str) -> String {
    if text.contains(',') || text.contains('"') || text.contains('\n') || text.contains('\r') {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

fn write_csv<W: Write>(table: &Table, out: &mut W) -> Result<()> {
    let header = table
        .columns
        .iter()
        .map(|c| csv_field(c))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{header}")?;
    for row in &table.rows {
        let line = row
            .iter()
            .map(|v| csv_field(&render_value(v)))
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn json_value(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::TinyInt(v) => serde_json::Value::from(*v),
        Value::SmallInt(v) => serde_json::Value::from(*v),
        Value::Int(v) => serde_json::Value::from(*v),
        Value::BigInt(v) => serde_json::Value::from(*v),
        Value::UTinyInt(v) => serde_json::Value::from(*v),
        Value::USmallInt(v) => serde_json::Value::from(*v),
        Value::UInt(v) => serde_json::Value::from(*v),
        Value::UBigInt(v) => serde_json::Value::from(*v),
        Value::Float(v) => serde_json::Number::from_f64(f64::from(*v))
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Double(v) => serde_json::Number::from_f64(*v)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        // Everything else (dates, timestamps, decimals, nested values) goes
        // out in its rendered text form.
        other => serde_json::Value::String(render_value(other)),
    }
}

fn row_object(table: &Table, row: &[Value]) -> serde_json::Value {
    let object: serde_json::Map<String, serde_json::Value> = table
        .columns
        .iter()
        .zip(row.iter())
        .map(|(column, value)| (column.clone(), json_value(value)))
        .collect();
    serde_json::Value::Object(object)
}

fn write_json<W: Write>(table: &Table, out: &mut W) -> Result<()> {
    let records: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| row_object(table, row))
        .collect();
    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out)?;
    Ok(())
}

fn write_ndjson<W: Write>(table: &Table, out: &mut W) -> Result<()> {
    for row in &table.rows {
        serde_json::to_writer(&mut *out, &row_object(table, row))?;
        writeln!(out)?;
    }
    Ok(())
}
