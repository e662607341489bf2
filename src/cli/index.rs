use clap::Args;
use serde::Serialize;

use crate::cli::{open_ready_engine, OutputFormat, SourceArgs};

#[derive(Args)]
pub struct IndexArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Serialize)]
struct IndexReport {
    source: String,
    working_file: String,
    index_file: String,
    records: usize,
    built: bool,
}

/// Execute index subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be opened, extracted or indexed.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: IndexArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (engine, build) = open_ready_engine(&args.source, verbose)?;

    let report = IndexReport {
        source: engine.source().display().to_string(),
        working_file: engine.working_path().display().to_string(),
        index_file: engine.index_path().display().to_string(),
        records: engine.index().map_or(0, |index| index.len()),
        built: build.is_some(),
    };

    match format {
        OutputFormat::Text => {
            let action = if report.built { "Built" } else { "Loaded" };
            println!(
                "{action} index of {} with {} record(s)",
                report.source, report.records
            );
            println!("  Index file:   {}", report.index_file);
            if report.working_file != report.source {
                println!("  Working file: {}", report.working_file);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Tsv => {
            println!("source\tworking_file\tindex_file\trecords\tbuilt");
            println!(
                "{}\t{}\t{}\t{}\t{}",
                report.source, report.working_file, report.index_file, report.records, report.built
            );
        }
    }

    Ok(())
}
