//! The ETL run: extract, clean, load, report.
//!
//! Each stage returns its records together with its own counters; nothing is
//! shared between stages except what is passed along explicitly.

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::{EtlConfig, SourceFiles};
use crate::parser::{read_csv, Extracted, RawCustomer, RawProduct, RawSale};
use crate::report::{FileStats, RunReport};
use crate::transform::{clean_customers, clean_products, clean_sales, CleanDataset};
use crate::ui::{Phase, Ui};
use crate::writer::{LoadSummary, SqliteStore};

/// Parsed but not yet validated input
pub struct Extraction {
    pub customers: Extracted<RawCustomer>,
    pub products: Extracted<RawProduct>,
    pub sales: Extracted<RawSale>,
}

/// Cleaned records plus the per-file statistics gathered so far
pub struct Cleaning {
    pub dataset: CleanDataset,
    pub customers: FileStats,
    pub products: FileStats,
    pub sales: FileStats,
}

/// Parse all three files. A missing or unreadable file is fatal.
pub fn extract(sources: &SourceFiles, ui: &mut impl Ui) -> Result<Extraction> {
    ui.set_phase(Phase::Extracting);

    let customers = read_csv(&sources.customers, &sources.csv)?;
    ui.log(read_message(&sources.customers, &customers.stats));
    let products = read_csv(&sources.products, &sources.csv)?;
    ui.log(read_message(&sources.products, &products.stats));
    let sales = read_csv(&sources.sales, &sources.csv)?;
    ui.log(read_message(&sources.sales, &sales.stats));

    Ok(Extraction {
        customers,
        products,
        sales,
    })
}

/// Validate, deduplicate and resolve references.
///
/// Customers and products are finalized before sales so orphan detection sees
/// only surviving records.
pub fn clean(extraction: Extraction, ui: &mut impl Ui) -> Cleaning {
    ui.set_phase(Phase::Cleaning);

    let customers = clean_customers(extraction.customers.rows);
    let products = clean_products(extraction.products.rows);
    let sales = clean_sales(
        extraction.sales.rows,
        &customers.records,
        &products.records,
    );

    let mut customer_stats = extraction.customers.stats;
    customer_stats.merge(&customers.stats);
    let mut product_stats = extraction.products.stats;
    product_stats.merge(&products.stats);
    let mut sales_stats = extraction.sales.stats;
    sales_stats.merge(&sales.stats);

    let dataset = CleanDataset {
        customers: customers.records,
        products: products.records,
        orders: sales.records,
    };
    ui.log(format!(
        "cleaned: {} customers, {} products, {} orders ({} items)",
        dataset.customers.len(),
        dataset.products.len(),
        dataset.orders.len(),
        dataset.order_item_count()
    ));

    Cleaning {
        dataset,
        customers: customer_stats,
        products: product_stats,
        sales: sales_stats,
    }
}

/// Dry run: everything up to, but not including, the load
pub fn check(sources: &SourceFiles, ui: &mut impl Ui) -> Result<RunReport> {
    let cleaning = clean(extract(sources, ui)?, ui);
    let mut report = file_report(sources, &cleaning, ui)?;
    report.dry_run = true;
    ui.set_phase(Phase::Complete);
    Ok(report)
}

/// Full run against the configured store. The report is written to
/// `config.report_path` before returning.
///
/// The store is opened and its schema checked before any file is read, so a
/// bad target fails the run without touching data.
pub fn run(config: &EtlConfig, ui: &mut impl Ui) -> Result<RunReport> {
    ui.set_phase(Phase::Connecting);
    ui.set_target(&config.database.display().to_string());

    let mut store = SqliteStore::connect(&config.database)?;
    store
        .prepare_schema(config.recreate)
        .context("Target store schema is not usable")?;

    let cleaning = clean(extract(&config.sources, ui)?, ui);
    let mut report = file_report(&config.sources, &cleaning, ui)?;

    ui.set_phase(Phase::Loading);
    store.reset()?;
    let summary = store.load(&cleaning.dataset, ui)?;
    record_load(&mut report, &config.sources, &summary)?;

    ui.set_phase(Phase::Reporting);
    report.tables = store.table_counts()?;
    report.write_to(&config.report_path, config.report_format)?;
    ui.log(format!("report written to {}", config.report_path.display()));
    info!(report = %config.report_path.display(), "run complete");

    store.finish()?;
    ui.set_phase(Phase::Complete);
    Ok(report)
}

/// Per-file counters after cleaning, one entry per source file
fn file_report(
    sources: &SourceFiles,
    cleaning: &Cleaning,
    ui: &mut impl Ui,
) -> Result<RunReport> {
    let mut report = RunReport::default();
    for (path, stats) in [
        (&sources.customers, &cleaning.customers),
        (&sources.products, &cleaning.products),
        (&sources.sales, &cleaning.sales),
    ] {
        let label = file_label(path)?;
        ui.file_cleaned(&label, stats);
        report.add_file(label, stats);
    }
    Ok(report)
}

/// Credit loaded rows to the file they came from. Sales rows become
/// order items, so that is what the sales file is credited with.
fn record_load(
    report: &mut RunReport,
    sources: &SourceFiles,
    summary: &LoadSummary,
) -> Result<()> {
    for (path, rows) in [
        (&sources.customers, summary.customers),
        (&sources.products, summary.products),
        (&sources.sales, summary.order_items),
    ] {
        let loaded = FileStats {
            records_loaded: rows,
            ..FileStats::default()
        };
        report.add_file(file_label(path)?, &loaded);
    }
    Ok(())
}

/// File name without directories, so reports compare equal across machines
fn file_label(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("Not a file path: {:?}", path))
}

fn read_message(path: &Path, stats: &FileStats) -> String {
    format!(
        "{}: {} rows read, {} unparseable",
        path.display(),
        stats.records_read,
        stats.rows_dropped()
    )
}
