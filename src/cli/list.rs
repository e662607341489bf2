use clap::Args;

use crate::cli::{open_ready_engine, OutputFormat, SourceArgs};
use crate::index::locator::compile;
use crate::index::store::IndexEntry;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Only list records matching this glob
    #[arg(short, long, default_value = "*")]
    pub pattern: String,

    /// Match the pattern against descriptions as well as names
    #[arg(long)]
    pub match_description: bool,

    /// Case-insensitive pattern matching
    #[arg(short, long)]
    pub ignore_case: bool,
}

/// Execute list subcommand
///
/// # Errors
///
/// Returns an error if the input cannot be indexed or the pattern is invalid.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ListArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let (engine, _) = open_ready_engine(&args.source, verbose)?;
    let locator = engine.locator()?;
    let glob = compile(&args.pattern, args.ignore_case)?;

    let entries: Vec<&IndexEntry> = locator
        .matching_entries(&glob, args.match_description)
        .collect();

    if verbose {
        eprintln!(
            "{} of {} record(s) match '{}'",
            entries.len(),
            locator.index().len(),
            glob.as_str()
        );
    }

    match format {
        OutputFormat::Text => print_text(&entries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Tsv => {
            println!("name\tdesc\toffset");
            for entry in &entries {
                println!("{}\t{}\t{}", entry.name, entry.description, entry.offset);
            }
        }
    }

    Ok(())
}

fn print_text(entries: &[&IndexEntry]) {
    let name_width = entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(0)
        .max(4);
    let offset_width = entries
        .iter()
        .map(|e| e.offset.to_string().len())
        .max()
        .unwrap_or(0)
        .max(6);

    println!("{:<name_width$}  {:>offset_width$}  Description", "Name", "Offset");
    for entry in entries {
        println!(
            "{:<name_width$}  {:>offset_width$}  {}",
            entry.name, entry.offset, entry.description
        );
    }
}
