use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

use crate::parser::CsvOptions;
use crate::report::ReportFormat;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_CUSTOMERS_FILE: &str = "customers_raw.csv";
pub const DEFAULT_PRODUCTS_FILE: &str = "products_raw.csv";
pub const DEFAULT_SALES_FILE: &str = "sales_raw.csv";
pub const DEFAULT_REPORT_FILE: &str = "data_quality_report.txt";
pub const DEFAULT_DATABASE_FILE: &str = "fleximart.db";

/// Where the three raw files live and how to read them
#[derive(Debug, Clone)]
pub struct SourceFiles {
    pub customers: PathBuf,
    pub products: PathBuf,
    pub sales: PathBuf,
    pub csv: CsvOptions,
}

impl SourceFiles {
    /// The default file names inside `data_dir`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            customers: data_dir.join(DEFAULT_CUSTOMERS_FILE),
            products: data_dir.join(DEFAULT_PRODUCTS_FILE),
            sales: data_dir.join(DEFAULT_SALES_FILE),
            csv: CsvOptions::default(),
        }
    }
}

/// Everything a full run needs
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub sources: SourceFiles,
    pub database: PathBuf,
    pub report_path: PathBuf,
    pub report_format: ReportFormat,
    /// Drop and recreate the tables instead of verifying them
    pub recreate: bool,
}

impl EtlConfig {
    pub fn new(sources: SourceFiles, database: PathBuf, report_path: PathBuf) -> Self {
        Self {
            sources,
            database,
            report_path,
            report_format: ReportFormat::Text,
            recreate: false,
        }
    }

    /// Log file used when the terminal is taken over by the UI
    pub fn log_path(&self) -> PathBuf {
        self.report_path.with_file_name("etl.log")
    }
}

/// `<platform data dir>/fleximart-etl/fleximart.db`, creating the directory
pub fn default_database_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "fleximart-etl")
        .context("Could not determine data directory")?;
    let dir = dirs.data_dir();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory {:?}", dir))?;
    Ok(dir.join(DEFAULT_DATABASE_FILE))
}

/// CSV delimiters must be a single ASCII character
pub fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(|b| b.is_ascii())
        .with_context(|| format!("Delimiter must be an ASCII character, got {:?}", delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_in_dir() {
        let sources = SourceFiles::in_dir(Path::new("input"));
        assert_eq!(sources.sales, Path::new("input").join("sales_raw.csv"));
        assert_eq!(sources.csv.delimiter, b',');
    }

    #[test]
    fn test_log_path_sits_next_to_report() {
        let config = EtlConfig::new(
            SourceFiles::in_dir(Path::new("data")),
            PathBuf::from("store.db"),
            PathBuf::from("out/report.txt"),
        );
        assert_eq!(config.log_path(), Path::new("out/etl.log"));
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert_eq!(delimiter_byte('\t').unwrap(), b'\t');
        assert!(delimiter_byte('§').is_err());
    }
}
