//! Shard directory handling: scan options, shard listing, and extraction of
//! the date token embedded in shard filenames.

use chrono::NaiveDate;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::ExplorerError;

/// Fixed extension for shard files within a source directory.
pub const SHARD_EXTENSION: &str = "csv";

/// Pattern for the date token embedded in shard filenames, e.g. `asg-2000-01-31.csv`.
/// The same pattern is interpolated into generated queries, so the Rust side and
/// the engine side always agree on which token a filename yields.
pub const DATE_TOKEN_PATTERN: &str = r"(\d{4}-\d{2}-\d{2})";

fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATE_TOKEN_PATTERN).expect("date token pattern is valid"))
}

/// How shard files are read: explicit delimiter and encoding rather than
/// sniffing, so every shard in a collection is parsed the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    pub delimiter: char,
    pub encoding: String,
    pub has_header: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            encoding: "utf-8".to_string(),
            has_header: true,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }
}

/// A directory of homogeneous, date-named shard files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    dir: PathBuf,
    pub options: ScanOptions,
}

impl SourceLocation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            options: ScanOptions::default(),
        }
    }

    pub fn with_options(dir: impl Into<PathBuf>, options: ScanOptions) -> Self {
        Self {
            dir: dir.into(),
            options,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Glob covering every shard in the directory, as handed to the engine.
    pub fn glob(&self) -> String {
        self.dir
            .join(format!("*.{}", SHARD_EXTENSION))
            .display()
            .to_string()
    }

    /// All shard files in the directory, sorted by filename. An unreadable
    /// directory is `SourceUnavailable`; an empty listing is not an error
    /// here (discovery decides whether that is fatal).
    pub fn shards(&self) -> Result<Vec<PathBuf>, ExplorerError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|err| ExplorerError::SourceUnavailable {
            path: self.dir.clone(),
            reason: err.to_string(),
        })?;

        let mut shards = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| ExplorerError::SourceUnavailable {
                path: self.dir.clone(),
                reason: err.to_string(),
            })?;
            let path = entry.path();
            let is_shard = path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case(SHARD_EXTENSION))
                    .unwrap_or(false);
            if is_shard {
                shards.push(path);
            }
        }
        shards.sort();
        Ok(shards)
    }

    /// The shard used for schema discovery: first in sorted filename order.
    pub fn representative_shard(&self) -> Result<PathBuf, ExplorerError> {
        self.shards()?
            .into_iter()
            .next()
            .ok_or_else(|| ExplorerError::SourceUnavailable {
                path: self.dir.clone(),
                reason: format!("no *.{} shards found", SHARD_EXTENSION),
            })
    }
}

/// Date encoded in a shard's filename. The first `YYYY-MM-DD` token wins when a
/// name contains more than one; a name with no token (or a token that is not a
/// real calendar date) yields `None` and the shard is treated as dateless.
pub fn shard_date(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;
    let token = date_token_re().find(name)?;
    NaiveDate::parse_from_str(token.as_str(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_date_from_filename() {
        let date = shard_date(Path::new("/data/asg-2000-01-31.csv"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2000, 1, 31));
    }

    #[test]
    fn shard_date_first_token_wins() {
        let date = shard_date(Path::new("backfill-2021-05-01-of-2021-06-01.csv"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 5, 1));
    }

    #[test]
    fn shard_date_missing_token() {
        assert_eq!(shard_date(Path::new("notes.csv")), None);
        assert_eq!(shard_date(Path::new("data-202-01-01.csv")), None);
    }

    #[test]
    fn shard_date_invalid_calendar_date() {
        assert_eq!(shard_date(Path::new("data-2021-13-45.csv")), None);
    }

    #[test]
    fn glob_covers_csv_extension() {
        let source = SourceLocation::new("/data/shards");
        assert!(source.glob().ends_with("*.csv"));
    }

    #[test]
    fn shards_listing_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b-2021-01-02.csv"), "id\n1\n").unwrap();
        std::fs::write(dir.path().join("a-2021-01-01.csv"), "id\n1\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "not a shard").unwrap();

        let source = SourceLocation::new(dir.path());
        let shards = source.shards().unwrap();
        let names: Vec<_> = shards
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a-2021-01-01.csv", "b-2021-01-02.csv"]);
        assert_eq!(source.representative_shard().unwrap(), shards[0]);
    }

    #[test]
    fn missing_directory_is_source_unavailable() {
        let source = SourceLocation::new("/definitely/not/a/real/dir");
        match source.shards() {
            Err(ExplorerError::SourceUnavailable { .. }) => {}
            other => panic!("expected SourceUnavailable, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn empty_directory_has_no_representative() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceLocation::new(dir.path());
        assert!(source.shards().unwrap().is_empty());
        assert!(matches!(
            source.representative_shard(),
            Err(ExplorerError::SourceUnavailable { .. })
        ));
    }
}
