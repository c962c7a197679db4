use std::path::PathBuf;
use thiserror::Error;

/// Error type for source discovery, query construction, and execution failures.
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The shard directory is missing, empty, or the representative shard
    /// cannot be parsed with the configured delimiter/encoding.
    #[error("source '{}' is unavailable: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    /// A requested column is not part of the discovered schema. Detected
    /// before any query is built.
    #[error("column '{column}' is not present in the discovered schema")]
    SchemaMismatch { column: String },
    /// The filter state cannot be turned into a query (for example an empty
    /// column selection, or a value filter with no values).
    #[error("cannot build query: {0}")]
    QueryBuild(String),
    /// The analytical engine rejected or failed the query. The message is
    /// surfaced verbatim for display.
    #[error("query execution failed: {message}")]
    Engine { message: String },
}
