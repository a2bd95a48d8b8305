use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{export::Quoting, inference::InferenceMode};

pub const DEFAULT_STORE_DIR: &str = ".dataglow";

#[derive(Debug, Parser)]
#[command(author, version, about = "Clean tabular data and prepare dashboard statistics", long_about = None)]
pub struct Cli {
    /// Directory holding the staged upload and cleaned table
    #[arg(long, global = true, default_value = DEFAULT_STORE_DIR)]
    pub store: PathBuf,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a delimited text file and preview its first rows
    Upload(UploadArgs),
    /// Clean the uploaded file: drop sparse rows, standardize dates, remove duplicates
    Clean(CleanArgs),
    /// Show statistics and chart data for the cleaned (or original) table
    Dashboard(DashboardArgs),
    /// Write the cleaned table as delimited text
    Download(DownloadArgs),
    /// Show which pipeline stages are reachable
    Status,
    /// Discard all staged data and start over
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum InferStrategy {
    /// Commit each column's type from the first data row
    #[default]
    FirstRow,
    /// Majority vote over a sample of rows
    Majority,
}

#[derive(Debug, Clone, Args)]
pub struct InferenceArgs {
    /// Column type inference strategy
    #[arg(long = "infer", value_enum, default_value_t = InferStrategy::FirstRow)]
    pub strategy: InferStrategy,
    /// Rows sampled by majority inference (0 means every row)
    #[arg(long = "sample-rows", default_value_t = 100)]
    pub sample_rows: usize,
}

impl InferenceArgs {
    pub fn mode(&self) -> InferenceMode {
        match self.strategy {
            InferStrategy::FirstRow => InferenceMode::FirstRow,
            InferStrategy::Majority => InferenceMode::Majority {
                sample_rows: self.sample_rows,
            },
        }
    }
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Input file to upload ('-' reads stdin and requires --name)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// File name to record for the upload (defaults to the input file name)
    #[arg(long)]
    pub name: Option<String>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Number of rows to preview
    #[arg(long, default_value_t = crate::workspace::UPLOAD_PREVIEW_ROWS)]
    pub rows: usize,
    #[command(flatten)]
    pub inference: InferenceArgs,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Number of cleaned rows to preview
    #[arg(long, default_value_t = crate::workspace::CLEAN_PREVIEW_ROWS)]
    pub rows: usize,
    /// Emit cleaning statistics as JSON instead of tables
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    /// Analyze the original upload instead of the cleaned table
    #[arg(long)]
    pub original: bool,
    /// Emit statistics and chart data as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum QuotingArg {
    /// Quote every field
    #[default]
    Always,
    /// Never quote (values containing commas corrupt the output)
    Never,
}

impl From<QuotingArg> for Quoting {
    fn from(value: QuotingArg) -> Self {
        match value {
            QuotingArg::Always => Quoting::Always,
            QuotingArg::Never => Quoting::Never,
        }
    }
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Output file, or a directory to write cleaned_data.csv into (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Field quoting policy
    #[arg(long, value_enum, default_value_t = QuotingArg::Always)]
    pub quoting: QuotingArg,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn majority_flag_maps_to_sampled_mode() {
        let cli = Cli::parse_from([
            "dataglow",
            "upload",
            "-i",
            "data.csv",
            "--infer",
            "majority",
            "--sample-rows",
            "25",
        ]);
        match cli.command {
            Commands::Upload(args) => {
                assert_eq!(
                    args.inference.mode(),
                    InferenceMode::Majority { sample_rows: 25 }
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.store, PathBuf::from(DEFAULT_STORE_DIR));
    }
}
