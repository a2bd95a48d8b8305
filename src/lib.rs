pub mod charts;
pub mod clean;
pub mod cli;
pub mod dates;
pub mod export;
pub mod inference;
pub mod io_utils;
pub mod model;
pub mod preview;
pub mod stats;
pub mod store;
pub mod tokenizer;
pub mod workspace;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde_json::json;

use crate::{
    cli::{Cli, Commands},
    store::DirectoryStore,
    workspace::{DashboardSource, Workspace, WorkspaceOptions},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dataglow", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Using staging directory {:?}", cli.store);
    match cli.command {
        Commands::Upload(args) => handle_upload(&cli.store, &args),
        Commands::Clean(args) => handle_clean(&cli.store, &args),
        Commands::Dashboard(args) => handle_dashboard(&cli.store, &args),
        Commands::Download(args) => handle_download(&cli.store, &args),
        Commands::Status => handle_status(&cli.store),
        Commands::Reset => handle_reset(&cli.store),
    }
}

fn open_workspace(store: &Path, options: WorkspaceOptions) -> Result<Workspace<DirectoryStore>> {
    let store = DirectoryStore::open(store)
        .with_context(|| format!("Opening staging store {store:?}"))?;
    Ok(Workspace::new(store, options))
}

fn handle_upload(store: &Path, args: &cli::UploadArgs) -> Result<()> {
    let file_name = match (&args.name, io_utils::is_dash(&args.input)) {
        (Some(name), _) => name.clone(),
        (None, true) => bail!("Reading from stdin requires --name"),
        (None, false) => args
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Input path {:?} has no file name", args.input))?,
    };
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let text = io_utils::read_text(&args.input, encoding)?;

    let options = WorkspaceOptions {
        inference: args.inference.mode(),
        ..WorkspaceOptions::default()
    };
    let mut workspace = open_workspace(store, options)?;
    let upload = workspace.upload(&file_name, &text)?;

    print!("{}", preview::render_preview(&upload.table, args.rows));
    println!(
        "Showing the first {} of {} row(s) from '{}'",
        upload.table.head(args.rows).len(),
        upload.table.row_count(),
        upload.file_name
    );
    Ok(())
}

fn handle_clean(store: &Path, args: &cli::CleanArgs) -> Result<()> {
    let mut workspace = open_workspace(store, WorkspaceOptions::default())?;
    let outcome = workspace.clean()?;
    let stats = outcome.cleaned.stats;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats).context("Serializing cleaning stats")?
        );
        return Ok(());
    }

    let headers = vec!["metric".to_string(), "value".to_string()];
    let rows = [
        ("original rows", stats.original_rows),
        ("cleaned rows", stats.cleaned_rows),
        ("removed rows", stats.removed_rows),
        ("duplicates removed", stats.duplicates_removed),
        ("missing values fixed", stats.missing_values_fixed),
        ("dates standardized", stats.dates_standardized),
    ]
    .iter()
    .map(|(label, value)| vec![label.to_string(), value.to_string()])
    .collect::<Vec<_>>();
    print!("{}", preview::render_table(&headers, &rows));
    println!();
    print!(
        "{}",
        preview::render_preview(&outcome.cleaned.table, args.rows)
    );
    info!(
        "Cleaned table staged ({} of {} row(s) kept)",
        stats.cleaned_rows, stats.original_rows
    );
    Ok(())
}

fn handle_dashboard(store: &Path, args: &cli::DashboardArgs) -> Result<()> {
    let workspace = open_workspace(store, WorkspaceOptions::default())?;
    let source = if args.original {
        DashboardSource::Original
    } else {
        DashboardSource::Cleaned
    };
    let dashboard = workspace.dashboard(source)?;

    if args.json {
        let document = json!({
            "stats": dashboard.stats,
            "charts": dashboard.charts,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&document).context("Serializing dashboard")?
        );
        return Ok(());
    }

    let stats = &dashboard.stats;
    println!(
        "rows: {}  columns: {}  missing values: {}  duplicate rows: {}",
        stats.total_rows, stats.total_columns, stats.missing_values, stats.duplicate_rows
    );
    println!();
    let column_headers = ["column", "type", "distinct", "missing"]
        .map(str::to_string)
        .to_vec();
    print!(
        "{}",
        preview::render_table(&column_headers, &stats.column_rows())
    );
    if !stats.summary.is_empty() {
        println!();
        let summary_headers = ["column", "min", "max", "mean", "median", "std_dev"]
            .map(str::to_string)
            .to_vec();
        print!(
            "{}",
            preview::render_table(&summary_headers, &stats.summary_rows())
        );
    }
    for chart in dashboard.charts.into_specs() {
        println!();
        println!("{} ({} point(s))", chart.title(), chart.point_count());
        let (headers, rows) = preview::chart_rows(&chart);
        print!("{}", preview::render_table(&headers, &rows));
    }
    Ok(())
}

fn handle_download(store: &Path, args: &cli::DownloadArgs) -> Result<()> {
    let options = WorkspaceOptions {
        quoting: args.quoting.into(),
        ..WorkspaceOptions::default()
    };
    let workspace = open_workspace(store, options)?;
    let text = workspace.download()?;
    let output = args.output.as_ref().map(|path| {
        if path.is_dir() {
            path.join(export::DEFAULT_EXPORT_NAME)
        } else {
            path.clone()
        }
    });
    io_utils::write_text(output.as_deref(), &text)?;
    let destination = output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!("Wrote cleaned data to {destination}");
    Ok(())
}

fn handle_status(store: &Path) -> Result<()> {
    let workspace = open_workspace(store, WorkspaceOptions::default())?;
    let file_name = workspace.file_name()?;
    println!(
        "file: {}",
        file_name.as_deref().unwrap_or("(none uploaded)")
    );
    let stages = workspace
        .reachable_stages()?
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    println!("reachable stages: {}", stages.join(", "));
    Ok(())
}

fn handle_reset(store: &Path) -> Result<()> {
    let mut workspace = open_workspace(store, WorkspaceOptions::default())?;
    workspace.reset()
}
