pub mod cli;
pub mod data;
pub mod delay;
pub mod error;
pub mod io_utils;
pub mod preprocess;
pub mod roles;
pub mod sentinel;
pub mod table;
pub mod timeparse;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, InputArgs},
    data::Table,
    io_utils::{LoadOptions, WriteOptions},
    preprocess::Preprocessed,
    roles::RoleCandidates,
};

pub use crate::{
    data::Cell,
    error::FlightDelayError,
    preprocess::{PreprocessReport, preprocess},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("flight_delays", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Process(args) => handle_process(&args),
        Commands::Roles(args) => handle_roles(&args.source),
        Commands::Preview(args) => handle_preview(&args),
    }
}

/// Loads the input, transforms it, and writes the enriched table.
/// Nothing is written when loading fails.
pub fn process_file(
    input: &Path,
    output: &Path,
    load: &LoadOptions,
    write: &WriteOptions,
    candidates: &RoleCandidates,
) -> Result<Preprocessed> {
    let table = io_utils::load_table(input, load)
        .with_context(|| format!("Loading flight table from {input:?}"))?;
    let processed = preprocess(&table, candidates);
    io_utils::write_table(&processed.table, output, write)
        .with_context(|| format!("Writing enriched table to {output:?}"))?;
    Ok(processed)
}

fn handle_process(args: &cli::ProcessArgs) -> Result<()> {
    // Delimited output on stdout must not be interleaved with the summary.
    let to_stdout = io_utils::is_dash(&args.output);
    if to_stdout && args.preview.is_some() {
        return Err(anyhow!("--preview cannot be combined with --output -"));
    }
    let (load, candidates) = resolve_source(&args.source)?;
    let write = WriteOptions {
        delimiter: args.output_delimiter,
        encoding: io_utils::resolve_encoding(args.output_encoding.as_deref())?,
    };
    info!(
        "Processing '{}' -> '{}'",
        args.source.input.display(),
        args.output.display()
    );
    let processed = process_file(&args.source.input, &args.output, &load, &write, &candidates)?;
    log_report(&processed.report);

    if to_stdout {
        return Ok(());
    }
    if let Some(rows) = args.preview {
        print!("{}", table::render_preview(&processed.table, rows));
    }
    println!("File processed successfully!");
    println!("Saved as: {}", args.output.display());
    println!("Columns detected: {:?}", processed.table.headers);
    Ok(())
}

fn handle_roles(source: &InputArgs) -> Result<()> {
    let (load, candidates) = resolve_source(source)?;
    let processed = load_and_preprocess(source, &load, &candidates)?;
    print!(
        "{}",
        table::render_role_report(&processed.report, &candidates)
    );
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs) -> Result<()> {
    let (load, candidates) = resolve_source(&args.source)?;
    let processed = load_and_preprocess(&args.source, &load, &candidates)?;
    print!("{}", table::render_preview(&processed.table, args.rows));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        processed.table.row_count().min(args.rows),
        processed.table.row_count(),
        args.source.input
    );
    Ok(())
}

fn resolve_source(source: &InputArgs) -> Result<(LoadOptions, RoleCandidates)> {
    let load = LoadOptions {
        delimiter: source.delimiter,
        sheet: source.sheet.clone(),
        encoding: io_utils::resolve_encoding(source.input_encoding.as_deref())?,
    };
    let candidates = match &source.roles {
        Some(path) => RoleCandidates::load(path)
            .with_context(|| format!("Loading role fragments from {path:?}"))?,
        None => RoleCandidates::default(),
    };
    debug!("Role fragments: {candidates:?}");
    Ok((load, candidates))
}

fn load_and_preprocess(
    source: &InputArgs,
    load: &LoadOptions,
    candidates: &RoleCandidates,
) -> Result<Preprocessed> {
    let table: Table = io_utils::load_table(&source.input, load)
        .with_context(|| format!("Loading flight table from {:?}", source.input))?;
    let processed = preprocess(&table, candidates);
    log_report(&processed.report);
    Ok(processed)
}

fn log_report(report: &PreprocessReport) {
    info!(
        "Kept {} of {} row(s); {} sentinel row(s) removed",
        report.output_rows(),
        report.input_rows,
        report.sentinel_rows_removed
    );
}
