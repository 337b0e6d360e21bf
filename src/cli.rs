use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub const DEFAULT_INPUT: &str = "cleaned_flight_scheduling.xlsx";
pub const DEFAULT_OUTPUT: &str = "final_flight_data_with_delays.xlsx";

#[derive(Debug, Parser)]
#[command(author, version, about = "Enrich flight schedule spreadsheets with delay metrics", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute departure and arrival delays and write an enriched copy
    Process(ProcessArgs),
    /// Show which columns the delay roles bind to
    Roles(InspectArgs),
    /// Render the enriched table to the console without writing a file
    Preview(PreviewArgs),
}

/// Options shared by every command that reads an input table.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input spreadsheet (.xlsx, .xls, .ods, .csv, .tsv, or '-' for stdin)
    #[arg(short = 'i', long = "input", default_value = DEFAULT_INPUT)]
    pub input: PathBuf,
    /// Worksheet name or 0-based index for workbook inputs
    #[arg(long)]
    pub sheet: Option<String>,
    /// Delimiter for text inputs (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of text inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// YAML file overriding the column name fragments used for each role
    #[arg(long = "roles")]
    pub roles: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Output file (.xlsx, .csv, .tsv, or '-' for stdout)
    #[arg(short = 'o', long = "output", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,
    /// Delimiter for text outputs (defaults by extension)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for text outputs (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Also print the first N rows of the enriched table (not with `-o -`)
    #[arg(long)]
    pub preview: Option<usize>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[command(flatten)]
    pub source: InputArgs,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: InputArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" => Ok(b','),
        "semicolon" => Ok(b';'),
        "pipe" => Ok(b'|'),
        other if other.len() == 1 && other.is_ascii() => Ok(other.as_bytes()[0]),
        other => Err(format!(
            "Delimiter must be a single ASCII character or one of tab/comma/semicolon/pipe, got '{other}'"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_delimiter_accepts_names_and_single_characters() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert_eq!(parse_delimiter("pipe"), Ok(b'|'));
        assert!(parse_delimiter("::").is_err());
        assert!(parse_delimiter("é").is_err());
    }

    #[test]
    fn process_defaults_to_workbook_paths() {
        let cli = Cli::try_parse_from(["flight-delays", "process"]).unwrap();
        let Commands::Process(args) = cli.command else {
            panic!("expected process command");
        };
        assert_eq!(args.source.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(args.output, PathBuf::from(DEFAULT_OUTPUT));
        assert!(args.preview.is_none());
    }
}
