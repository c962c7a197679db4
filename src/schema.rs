//! Schema discovery: learn column names and a small preview from one
//! representative shard, reading as little as possible.

use tracing::debug;

use crate::engine::Engine;
use crate::error::ExplorerError;
use crate::query;
use crate::source::SourceLocation;
use crate::table::Table;

/// Rows shown in the discovery preview.
pub const PREVIEW_ROWS: usize = 5;

/// Discovered shape of the collection: ordered column names plus the first
/// few rows of the representative shard for display.
#[derive(Debug, Clone)]
pub struct SchemaInfo {
    pub columns: Vec<String>,
    pub preview: Table,
}

/// Read the first shard in sorted filename order through the shared engine
/// connection. Zero shards or a shard the engine cannot parse with the
/// configured delimiter/encoding is `SourceUnavailable`; nothing is written.
pub fn discover(
    engine: &mut Engine,
    source: &SourceLocation,
    preview_rows: usize,
) -> Result<SchemaInfo, ExplorerError> {
    let shard = source.representative_shard()?;
    debug!(shard = %shard.display(), "discovering schema");

    let sql = format!("SELECT *\nFROM {}", query::scan_one(source, &shard));
    let preview = engine
        .execute(&sql, preview_rows)
        .map_err(|err| match err {
            ExplorerError::Engine { message } => ExplorerError::SourceUnavailable {
                path: shard.clone(),
                reason: message,
            },
            other => other,
        })?;

    Ok(SchemaInfo {
        columns: preview.columns.clone(),
        preview,
    })
}
