//! Thin gateway to the embedded analytical engine.
//!
//! One connection serves every probe and execution; methods take `&mut self`
//! so it cannot be reentered concurrently. The engine parallelizes shard
//! scanning internally; that is opaque here. Failures are surfaced verbatim
//! with no retries and no partial results.

use duckdb::types::Value;
use duckdb::Connection;
use tracing::debug;

use crate::error::ExplorerError;
use crate::table::Table;

pub struct Engine {
    conn: Connection,
}

impl Engine {
    /// Open an in-memory engine. The data stays in the shard files; the
    /// engine only hosts query execution.
    pub fn new() -> Result<Self, ExplorerError> {
        let conn = Connection::open_in_memory().map_err(engine_err)?;
        Ok(Self { conn })
    }

    /// Execute query text with a row limit appended at call time. The limit
    /// is never part of the stored text, so the same built query can serve a
    /// preview run and a larger export run.
    pub fn execute(&mut self, query: &str, row_limit: usize) -> Result<Table, ExplorerError> {
        let sql = format!("{query}\nLIMIT {row_limit}");
        debug!(row_limit, "executing query");
        self.run(&sql)
    }

    /// Execute count-shaped text and return the single count cell.
    pub fn count(&mut self, query: &str) -> Result<u64, ExplorerError> {
        let count: i64 = self
            .conn
            .query_row(query, [], |row| row.get(0))
            .map_err(engine_err)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Run text as-is and materialize the complete result.
    fn run(&mut self, sql: &str) -> Result<Table, ExplorerError> {
        let columns = self.describe(sql)?;
        let mut stmt = self.conn.prepare(sql).map_err(engine_err)?;
        let mut rows = stmt.query([]).map_err(engine_err)?;

        let mut data = Vec::new();
        while let Some(row) = rows.next().map_err(engine_err)? {
            let mut record = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                record.push(row.get::<_, Value>(idx).map_err(engine_err)?);
            }
            data.push(record);
        }
        debug!(rows = data.len(), columns = columns.len(), "query complete");
        Ok(Table {
            columns,
            rows: data,
        })
    }

    /// Ask the engine for the result shape of `sql` without running it, so
    /// column names are known even for an empty result.
    fn describe(&self, sql: &str) -> Result<Vec<String>, ExplorerError> {
        let mut stmt = self
            .conn
            .prepare(&format!("DESCRIBE {sql}"))
            .map_err(engine_err)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(engine_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(engine_err)?;
        Ok(names)
    }
}

fn engine_err(err: duckdb::Error) -> ExplorerError {
    ExplorerError::Engine {
        message: err.to_string(),
    }
}
