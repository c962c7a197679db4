use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::fs::File;
use tracing_subscriber::EnvFilter;

use shardview::cli::Args;
use shardview::{
    export, render_value, shard_date, AppConfig, ConfigManager, Explorer, FilterState, Preset,
    PresetStore, ScanOptions, SourceLocation, Table, APP_NAME,
};

/// Preset maintenance verbs that need no source directory scan.
fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.list_presets {
        let store = PresetStore::default_location(APP_NAME)?;
        let presets = store.load_all()?;
        if presets.is_empty() {
            println!("No presets saved");
        }
        for (name, preset) in presets {
            let window = match preset.date_range {
                Some((from, to)) => format!(", {from}..{to}"),
                None => String::new(),
            };
            println!("{name}: {} filter(s){window}", preset.value_filters.len());
        }
        return Ok(Some(()));
    }

    if let Some(name) = &args.delete_preset {
        let store = PresetStore::default_location(APP_NAME)?;
        if store.delete(name)? {
            println!("Preset '{name}' deleted");
        } else {
            println!("No preset named '{name}'");
        }
        return Ok(Some(()));
    }

    Ok(None)
}

fn load_app_config() -> AppConfig {
    match ConfigManager::new(APP_NAME) {
        Ok(manager) => manager.load_config().unwrap_or_else(|err| {
            tracing::warn!(%err, "could not load config, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Assemble the filter state: preset first, then flags layered on top.
fn build_state(args: &Args, config: &AppConfig, explorer: &Explorer) -> Result<FilterState> {
    let columns = if args.columns.is_empty() {
        explorer.schema().columns.iter().take(5).cloned().collect()
    } else {
        args.columns.clone()
    };
    let mut state = FilterState::new(columns);

    if let Some(name) = &args.preset {
        let store = PresetStore::default_location(APP_NAME)?;
        let presets = store.load_all()?;
        let preset = presets
            .get(name)
            .ok_or_else(|| eyre!("no preset named '{name}'"))?;
        preset.apply_to(&mut state);
    }

    for (column, values) in args.parse_filters()? {
        state.value_filters.insert(column, values);
    }
    if let Some(range) = args.date_range()? {
        state.date_range = Some(range);
    }
    state.sampling = args.sample;
    state.row_limit = args.limit.unwrap_or(config.row_limit);
    Ok(state)
}

fn print_table(table: &Table) {
    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(render_value).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.len()).collect();
    for row in &rendered {
        for (idx, cell) in row.iter().enumerate() {
            if idx < widths.len() {
                widths[idx] = widths[idx].max(cell.len());
            }
        }
    }

    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<w$}", w = *width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line(table.columns.clone()));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ")
    );
    for row in rendered {
        println!("{}", line(row));
    }
}

fn run(args: &Args) -> Result<()> {
    let config = load_app_config();

    let mut options = ScanOptions::default()
        .with_delimiter(config.delimiter)
        .with_encoding(config.encoding.clone());
    if let Some(delimiter) = args.delimiter {
        options = options.with_delimiter(delimiter);
    }
    let source = SourceLocation::with_options(args.path.clone(), options);
    let mut explorer = Explorer::open_with(source, config.preview_rows)?;

    if args.schema {
        let shards = explorer.source().shards()?;
        let mut dates: Vec<_> = shards.iter().filter_map(|p| shard_date(p)).collect();
        dates.sort();
        match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => {
                println!("{} shards covering {first}..{last}", shards.len())
            }
            _ => println!("{} shards", shards.len()),
        }
        let schema = explorer.schema();
        println!("Columns: {}", schema.columns.join(", "));
        println!();
        print_table(&schema.preview);
        return Ok(());
    }

    if let Some(column) = &args.distinct {
        let values = explorer
            .distinct_values(column)
            .ok_or_else(|| eyre!("could not list distinct values for '{column}'"))?;
        for value in values {
            println!("{value}");
        }
        return Ok(());
    }

    let state = build_state(args, &config, &explorer)?;

    if let Some(name) = &args.save_preset {
        let store = PresetStore::default_location(APP_NAME)?;
        store.save(name, Preset::from_state(&state))?;
        println!("Preset '{name}' saved");
    }

    if args.count {
        match explorer.probe_row_count(&state) {
            Some(count) => println!("{count}"),
            None => println!("unknown"),
        }
        return Ok(());
    }

    // A fresh cache is always stale, so a single invocation runs exactly once.
    let (query, table) = {
        let entry = explorer.run(&state)?;
        (entry.query.clone(), entry.table.clone())
    };

    if args.show_query {
        println!("{query}");
        println!();
    }
    print_table(&table);
    println!();
    println!("{} rows", table.num_rows());
    if table.num_rows() == state.row_limit && state.sampling.is_none() {
        eprintln!(
            "note: result hit the {}-row limit; use --sample for an unbiased subset or --count for the total",
            state.row_limit
        );
    }

    if let Some(path) = &args.export {
        let export_table = match args.export_limit {
            Some(limit) => explorer.rerun_cached(limit)?,
            None => table,
        };
        let mut file = File::create(path)?;
        export::write_table(&export_table, args.format, &mut file)?;
        println!("Exported {} rows to {}", export_table.num_rows(), path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }
    run(&args)
}
