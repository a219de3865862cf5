use anyhow::{bail, Context, Result};
use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use super::record::SourceRow;
use crate::error::RowError;
use crate::report::FileStats;

/// Reader settings shared by all three input files
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Rows that survived the parse step plus the counters for the file
#[derive(Debug)]
pub struct Extracted<T> {
    pub rows: Vec<SourceRow<T>>,
    pub stats: FileStats,
}

/// Read a CSV file with a header row into typed raw records
pub fn read_csv<T: DeserializeOwned>(path: &Path, options: &CsvOptions) -> Result<Extracted<T>> {
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    read_csv_from(file, options, &path.display().to_string())
}

/// Same as [`read_csv`] for any reader. `source` only appears in log lines.
pub fn read_csv_from<R: Read, T: DeserializeOwned>(
    reader: R,
    options: &CsvOptions,
    source: &str,
) -> Result<Extracted<T>> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = normalize_headers(
        rdr.headers()
            .with_context(|| format!("Failed to read header row of {}", source))?,
    );
    if headers.is_empty() {
        bail!("{} has no header row", source);
    }

    let mut rows = Vec::new();
    let mut stats = FileStats::default();
    let mut raw = ByteRecord::new();

    loop {
        match rdr.read_byte_record(&mut raw) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if e.is_io_error() => {
                return Err(e).with_context(|| format!("Failed to read {}", source));
            }
            Err(e) => {
                stats.records_read += 1;
                let err = RowError::Parse(e.to_string());
                warn!(source, error = %err, "skipping row");
                stats.record_drop(&err);
                continue;
            }
        }

        stats.records_read += 1;
        let line = raw.position().map(|p| p.line()).unwrap_or(0);

        match parse_row(&raw, &headers) {
            Ok(record) => rows.push(SourceRow { line, record }),
            Err(err) => {
                warn!(source, line, error = %err, "skipping row");
                stats.record_drop(&err);
            }
        }
    }

    debug!(source, read = stats.records_read, parsed = rows.len(), "parsed file");
    Ok(Extracted { rows, stats })
}

fn parse_row<T: DeserializeOwned>(raw: &ByteRecord, headers: &StringRecord) -> Result<T, RowError> {
    if raw.len() != headers.len() {
        return Err(RowError::Parse(format!(
            "expected {} fields, found {}",
            headers.len(),
            raw.len()
        )));
    }

    let record = StringRecord::from_byte_record(raw.clone())
        .map_err(|e| RowError::Parse(format!("invalid UTF-8: {}", e)))?;

    record
        .deserialize(Some(headers))
        .map_err(|e| RowError::Parse(e.to_string()))
}

/// Lower-case header names and drop a leading byte order mark
fn normalize_headers(headers: &StringRecord) -> StringRecord {
    headers
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_ascii_lowercase())
        .collect()
}
