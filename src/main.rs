use anyhow::{anyhow, Context, Result};
use fleximart_etl::{
    cli::{Cli, Commands},
    config::{default_database_path, EtlConfig},
    logging::init_logging,
    pipeline,
    ui::{LogUi, UiApp},
    writer::generate_schema_script,
    RunReport,
};
use std::time::Instant;

fn main() -> Result<()> {
    // A missing .env is fine
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            source,
            database,
            report,
            format,
            recreate,
            tui,
        } => {
            let start = Instant::now();

            let database = match database {
                Some(path) => path,
                None => default_database_path()?,
            };
            let mut config = EtlConfig::new(source.to_sources()?, database, report);
            config.report_format = format;
            config.recreate = recreate;

            let run_report = if tui {
                init_logging(cli.verbose, Some(&config.log_path()))?;
                let mut ui = UiApp::new()?;
                let run_report = pipeline::run(&config, &mut ui)?;
                ui.finish(&run_report.render_text())?;
                run_report
            } else {
                init_logging(cli.verbose, None)?;
                pipeline::run(&config, &mut LogUi)?
            };

            print_summary(&run_report);
            println!(
                "\nLoaded {:?} and wrote {:?} in {:.1}s",
                config.database,
                config.report_path,
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Check { source, format } => {
            init_logging(cli.verbose, None)?;
            let run_report = pipeline::check(&source.to_sources()?, &mut LogUi)?;
            println!("{}", run_report.render(format)?);
        }

        Commands::Schema { output } => {
            let script = generate_schema_script().map_err(|e| anyhow!(e))?;
            match output {
                Some(path) => {
                    std::fs::write(&path, script)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Schema written to {:?}", path);
                }
                None => print!("{}", script),
            }
        }
    }

    Ok(())
}

fn print_summary(report: &RunReport) {
    println!("\nFile summary:");
    for file in &report.files {
        println!(
            "  {:<24} read {:>6}  loaded {:>6}  dropped {:>6}",
            file.file,
            file.stats.records_read,
            file.stats.records_loaded,
            file.stats.rows_dropped()
        );
    }
    println!("\nTable counts:");
    for table in &report.tables {
        println!("  {:<24} {:>6}", table.table, table.rows);
    }
}
