//! Data quality report.
//!
//! Every pipeline stage returns its own [`FileStats`] instead of mutating
//! shared counters; the pipeline merges them into a [`RunReport`] at the end.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{DropReason, RowError};

/// Counters for one source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub records_read: u64,
    pub duplicates_removed: u64,
    /// Optional fields that were absent or unusable and got a default
    pub values_filled: u64,
    pub records_loaded: u64,
    pub dropped: BTreeMap<DropReason, u64>,
}

impl FileStats {
    pub fn record_drop(&mut self, err: &RowError) {
        self.add_drops(err.reason(), 1);
    }

    pub fn add_drops(&mut self, reason: DropReason, n: u64) {
        if n > 0 {
            *self.dropped.entry(reason).or_insert(0) += n;
        }
    }

    pub fn dropped_for(&self, reason: DropReason) -> u64 {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }

    pub fn rows_dropped(&self) -> u64 {
        self.dropped.values().sum()
    }

    /// Loaded rows as a percentage of rows read
    pub fn success_rate(&self) -> Option<f64> {
        if self.records_read == 0 {
            None
        } else {
            Some(self.records_loaded as f64 / self.records_read as f64 * 100.0)
        }
    }

    pub fn merge(&mut self, other: &FileStats) {
        self.records_read += other.records_read;
        self.duplicates_removed += other.duplicates_removed;
        self.values_filled += other.values_filled;
        self.records_loaded += other.records_loaded;
        for (reason, n) in &other.dropped {
            self.add_drops(*reason, *n);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub stats: FileStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCount {
    pub table: String,
    pub rows: u64,
}

/// Statistics for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub files: Vec<FileReport>,
    pub tables: Vec<TableCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl RunReport {
    /// Merge `stats` into the entry for `file`, creating it on first use
    pub fn add_file(&mut self, file: impl Into<String>, stats: &FileStats) {
        let file = file.into();
        match self.files.iter_mut().find(|f| f.file == file) {
            Some(existing) => existing.stats.merge(stats),
            None => self.files.push(FileReport {
                file,
                stats: stats.clone(),
            }),
        }
    }

    pub fn file(&self, file: &str) -> Option<&FileStats> {
        self.files.iter().find(|f| f.file == file).map(|f| &f.stats)
    }

    pub fn table_rows(&self, table: &str) -> Option<u64> {
        self.tables.iter().find(|t| t.table == table).map(|t| t.rows)
    }

    pub fn render(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Ok(self.render_text()),
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).context("Failed to serialize report")
            }
        }
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }

    /// Write the report, replacing any previous one
    pub fn write_to(&self, path: &Path, format: ReportFormat) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory {:?}", parent))?;
        }
        let body = self.render(format)?;
        std::fs::write(path, body).with_context(|| format!("Failed to write report {:?}", path))?;
        Ok(())
    }
}

/// The plain-text execution report
impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(50);

        writeln!(f, "FLEXIMART ETL EXECUTION REPORT")?;
        writeln!(f, "==============================")?;
        writeln!(f)?;
        if self.dry_run {
            writeln!(f, "DRY RUN: nothing was written to the store.")?;
            writeln!(f)?;
        }
        writeln!(f, "DATE HANDLING POLICY:")?;
        writeln!(f, "- registration_date (nullable): unparseable dates stored as NULL")?;
        writeln!(f, "- order_date (NOT NULL): rows with unparseable dates are dropped")?;
        writeln!(f, "All valid dates are stored as YYYY-MM-DD.")?;
        writeln!(f)?;

        for report in &self.files {
            let s = &report.stats;
            writeln!(f, "FILE: {}", report.file)?;
            writeln!(f, "{}", rule)?;
            writeln!(f, "  Records Processed:        {}", s.records_read)?;
            writeln!(f, "  Duplicates Removed:       {}", s.duplicates_removed)?;
            writeln!(
                f,
                "  Missing Values Handled:   {}",
                s.values_filled + s.rows_dropped()
            )?;
            writeln!(f, "    - Filled with defaults: {}", s.values_filled)?;
            writeln!(f, "    - Dropped:              {}", s.rows_dropped())?;
            writeln!(f, "  Records Loaded:           {}", s.records_loaded)?;
            match s.success_rate() {
                Some(rate) => writeln!(f, "  Success Rate:             {:.2}%", rate)?,
                None => writeln!(f, "  Success Rate:             N/A (no records processed)")?,
            }
            if !s.dropped.is_empty() {
                writeln!(f, "  Drop Reasons:")?;
                for (reason, n) in &s.dropped {
                    writeln!(f, "    * {}: {}", reason, n)?;
                }
            }
            writeln!(f)?;
        }

        if !self.tables.is_empty() {
            writeln!(f, "FINAL TABLE SIZES")?;
            writeln!(f, "{}", rule)?;
            for t in &self.tables {
                writeln!(f, "  {:20} {:>8}", t.table, t.rows)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(read: u64, loaded: u64) -> FileStats {
        FileStats {
            records_read: read,
            records_loaded: loaded,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_adds_counters_and_reasons() {
        let mut a = stats(10, 0);
        a.add_drops(DropReason::MissingRequiredField, 2);
        let mut b = stats(0, 7);
        b.duplicates_removed = 1;
        b.add_drops(DropReason::MissingRequiredField, 1);
        b.add_drops(DropReason::OrphanReference, 0);

        a.merge(&b);
        assert_eq!(a.records_read, 10);
        assert_eq!(a.records_loaded, 7);
        assert_eq!(a.duplicates_removed, 1);
        assert_eq!(a.dropped_for(DropReason::MissingRequiredField), 3);
        assert!(!a.dropped.contains_key(&DropReason::OrphanReference));
        assert_eq!(a.rows_dropped(), 3);
    }

    #[test]
    fn test_success_rate() {
        assert_eq!(stats(0, 0).success_rate(), None);
        assert_eq!(stats(4, 3).success_rate(), Some(75.0));
    }

    #[test]
    fn test_render_text_lists_drop_reasons() {
        let mut report = RunReport::default();
        let mut s = stats(5, 3);
        s.add_drops(DropReason::OrphanReference, 2);
        report.add_file("sales_raw.csv", &s);
        report.tables.push(TableCount {
            table: "order_items".into(),
            rows: 3,
        });

        let text = report.render_text();
        assert_eq!(text, report.to_string());
        assert!(text.starts_with("FLEXIMART ETL EXECUTION REPORT\n"));
        assert!(!text.contains("DRY RUN"));
        assert!(text.contains("FILE: sales_raw.csv"));
        assert!(text.contains("Success Rate:             60.00%"));
        assert!(text.contains("* orphan reference: 2"));
        assert!(text.contains("order_items"));
    }

    #[test]
    fn test_render_text_dry_run_without_tables() {
        let mut report = RunReport {
            dry_run: true,
            ..RunReport::default()
        };
        report.add_file("products_raw.csv", &FileStats::default());

        let text = report.render_text();
        assert!(text.contains("DRY RUN: nothing was written to the store."));
        assert!(text.contains("Success Rate:             N/A (no records processed)"));
        assert!(!text.contains("FINAL TABLE SIZES"));
    }

    #[test]
    fn test_render_json() {
        let mut report = RunReport::default();
        let mut s = stats(1, 0);
        s.add_drops(DropReason::ParseError, 1);
        report.add_file("customers_raw.csv", &s);

        let json = report.render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"][0]["stats"]["dropped"]["parse_error"], 1);
    }
}
