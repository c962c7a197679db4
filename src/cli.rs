use chrono::NaiveDate;
use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::export::ExportFormat;

/// Command-line arguments for shardview
#[derive(Parser, Debug)]
#[command(version, about = "shardview")]
pub struct Args {
    /// Directory containing the dated CSV shards
    pub path: PathBuf,

    /// Columns to project, comma separated (defaults to the first five discovered)
    #[arg(long = "columns", value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Value filter of the form column=value[|value...]; repeatable
    #[arg(long = "filter")]
    pub filters: Vec<String>,

    /// Inclusive start of the filename-date window (YYYY-MM-DD); requires --to
    #[arg(long = "from")]
    pub from: Option<NaiveDate>,

    /// Inclusive end of the filename-date window (YYYY-MM-DD); requires --from
    #[arg(long = "to")]
    pub to: Option<NaiveDate>,

    /// Ask the engine for a random sample of this many rows
    #[arg(long = "sample")]
    pub sample: Option<usize>,

    /// Maximum rows to materialize
    #[arg(long = "limit")]
    pub limit: Option<usize>,

    /// Field delimiter used to read the shards
    #[arg(long = "delimiter")]
    pub delimiter: Option<char>,

    /// Print the matching row count instead of rows
    #[arg(long = "count", action)]
    pub count: bool,

    /// Print the generated query before the results
    #[arg(long = "show-query", action)]
    pub show_query: bool,

    /// Print the discovered schema and data preview, then exit
    #[arg(long = "schema", action)]
    pub schema: bool,

    /// List distinct values of this column, then exit
    #[arg(long = "distinct")]
    pub distinct: Option<String>,

    /// Write the results to this file
    #[arg(long = "export")]
    pub export: Option<PathBuf>,

    /// Export format
    #[arg(long = "format", value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Re-run the query with this row limit for the export
    #[arg(long = "export-limit")]
    pub export_limit: Option<usize>,

    /// Load a saved filter preset by name
    #[arg(long = "preset")]
    pub preset: Option<String>,

    /// Save the resulting filters under this preset name
    #[arg(long = "save-preset")]
    pub save_preset: Option<String>,

    /// Delete a saved preset and exit
    #[arg(long = "delete-preset")]
    pub delete_preset: Option<String>,

    /// List saved presets and exit
    #[arg(long = "list-presets", action)]
    pub list_presets: bool,
}

impl Args {
    /// Parse repeated `--filter column=value|value` flags. Values are taken
    /// exactly as typed (no trimming, case preserved).
    pub fn parse_filters(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut filters = BTreeMap::new();
        for raw in &self.filters {
            let (column, values) = raw
                .split_once('=')
                .ok_or_else(|| eyre!("invalid --filter '{raw}': expected column=value[|value...]"))?;
            if column.is_empty() {
                return Err(eyre!("invalid --filter '{raw}': empty column name"));
            }
            let values: Vec<String> = values.split('|').map(str::to_string).collect();
            if values.iter().all(|v| v.is_empty()) {
                return Err(eyre!("invalid --filter '{raw}': no values given"));
            }
            filters.insert(column.to_string(), values);
        }
        Ok(filters)
    }

    /// Both bounds or neither; a lone `--from` or `--to` is refused rather
    /// than silently ignored.
    pub fn date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => {
                if from > to {
                    return Err(eyre!("--from {from} is after --to {to}"));
                }
                Ok(Some((from, to)))
            }
            (None, None) => Ok(None),
            _ => Err(eyre!("--from and --to must be given together")),
        }
    }
}
