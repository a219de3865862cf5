use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::{
    delimiter_byte, SourceFiles, DEFAULT_CUSTOMERS_FILE, DEFAULT_DATA_DIR, DEFAULT_PRODUCTS_FILE,
    DEFAULT_REPORT_FILE, DEFAULT_SALES_FILE,
};
use crate::parser::CsvOptions;
use crate::report::ReportFormat;

#[derive(Parser, Debug)]
#[command(name = "fleximart-etl")]
#[command(version, about = "Clean FlexiMart CSV exports and load them into SQLite")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Location and dialect of the three raw input files
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Directory containing the raw CSV files
    #[arg(short, long, env = "FLEXIMART_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Customers file name, relative to the data directory
    #[arg(long, default_value = DEFAULT_CUSTOMERS_FILE)]
    pub customers: PathBuf,

    /// Products file name, relative to the data directory
    #[arg(long, default_value = DEFAULT_PRODUCTS_FILE)]
    pub products: PathBuf,

    /// Sales file name, relative to the data directory
    #[arg(long, default_value = DEFAULT_SALES_FILE)]
    pub sales: PathBuf,

    /// Field delimiter
    #[arg(long, default_value_t = ',')]
    pub delimiter: char,
}

impl SourceArgs {
    pub fn to_sources(&self) -> Result<SourceFiles> {
        Ok(SourceFiles {
            customers: self.data_dir.join(&self.customers),
            products: self.data_dir.join(&self.products),
            sales: self.data_dir.join(&self.sales),
            csv: CsvOptions {
                delimiter: delimiter_byte(self.delimiter)?,
            },
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean the raw files and load them into the database
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// SQLite database path (defaults to the platform data directory)
        #[arg(long, env = "FLEXIMART_DB")]
        database: Option<PathBuf>,

        /// Where to write the data quality report
        #[arg(short, long, env = "FLEXIMART_REPORT", default_value = DEFAULT_REPORT_FILE)]
        report: PathBuf,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,

        /// Drop and recreate the tables before loading
        #[arg(long)]
        recreate: bool,

        /// Show a terminal dashboard while running
        #[arg(long)]
        tui: bool,
    },

    /// Clean the raw files and print the report without touching a database
    Check {
        #[command(flatten)]
        source: SourceArgs,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
    },

    /// Print the DDL for the target tables
    Schema {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["fleximart-etl", "run", "--data-dir", "in"]).unwrap();
        match cli.command {
            Commands::Run {
                source,
                report,
                format,
                recreate,
                tui,
                ..
            } => {
                let sources = source.to_sources().unwrap();
                assert_eq!(sources.customers, Path::new("in").join("customers_raw.csv"));
                assert_eq!(sources.csv.delimiter, b',');
                assert_eq!(report, Path::new("data_quality_report.txt"));
                assert_eq!(format, ReportFormat::Text);
                assert!(!recreate && !tui);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_check_with_overrides() {
        let cli = Cli::try_parse_from([
            "fleximart-etl",
            "-v",
            "check",
            "--sales",
            "sales.csv",
            "--delimiter",
            ";",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Check { source, format } => {
                let sources = source.to_sources().unwrap();
                assert!(sources.sales.ends_with("sales.csv"));
                assert_eq!(sources.csv.delimiter, b';');
                assert_eq!(format, ReportFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
