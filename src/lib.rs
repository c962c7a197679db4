//! Query-construction and result-caching engine for exploring large,
//! date-sharded CSV collections without loading them into memory.
//!
//! A caller owns one [`Explorer`] per source directory. Filter changes are
//! cheap and local; nothing touches the engine until the caller explicitly
//! triggers [`Explorer::run`], which builds query text, executes it with the
//! state's row limit, and replaces the single-slot result cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod explorer;
pub mod export;
pub mod filter;
pub mod fingerprint;
pub mod presets;
pub mod query;
pub mod schema;
pub mod source;
pub mod table;

pub use cache::{CacheEntry, ResultCache};
pub use config::{AppConfig, ConfigManager};
pub use engine::Engine;
pub use error::ExplorerError;
pub use explorer::Explorer;
pub use export::ExportFormat;
pub use filter::FilterState;
pub use fingerprint::{fingerprint, Fingerprint};
pub use presets::{Preset, PresetStore};
pub use query::{build_query, escape_literal, QueryMode, DATE_ATTRIBUTE};
pub use schema::SchemaInfo;
pub use source::{shard_date, ScanOptions, SourceLocation};
pub use table::{render_value, Table};

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "shardview";
