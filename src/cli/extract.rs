use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;

use crate::cli::{open_ready_engine, OutputFormat, SourceArgs};
use crate::core::record::DEFAULT_LINE_WIDTH;
use crate::engine::config::ExtractOptions;
use crate::engine::interpreter::ScriptSummary;

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Script file with one statement per line ('-' for stdin)
    #[arg(short, long)]
    pub script: Option<PathBuf>,

    /// Inline statement; can be given multiple times and runs after --script
    #[arg(short = 'e', long = "expr")]
    pub exprs: Vec<String>,

    /// Output FASTA file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Match patterns against record descriptions as well as names
    #[arg(long)]
    pub match_description: bool,

    /// Case-insensitive pattern matching
    #[arg(short, long)]
    pub ignore_case: bool,

    /// Wrap width of sequence lines
    #[arg(short = 'w', long, default_value_t = DEFAULT_LINE_WIDTH)]
    pub line_width: usize,
}

/// Execute extract subcommand
///
/// # Errors
///
/// Returns an error if no script is given, the input cannot be indexed, or
/// reading the script or writing the output fails.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ExtractArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let script = read_script(&args)?;

    let (engine, _) = open_ready_engine(&args.source, verbose)?;

    let options = ExtractOptions {
        match_description: args.match_description,
        ignore_case: args.ignore_case,
        line_width: args.line_width,
    };

    let summary = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut sink = BufWriter::new(file);
            let summary = engine.run_script(&script, options, &mut sink)?;
            sink.flush()?;
            summary
        }
        None => {
            let stdout = std::io::stdout();
            let mut sink = BufWriter::new(stdout.lock());
            let summary = engine.run_script(&script, options, &mut sink)?;
            // End the last record's line
            if summary.records_written > 0 {
                sink.write_all(b"\n")?;
            }
            sink.flush()?;
            summary
        }
    };

    if verbose || args.output.is_some() {
        print_summary(&summary, format)?;
    }

    Ok(())
}

fn read_script(args: &ExtractArgs) -> anyhow::Result<String> {
    let mut script = String::new();

    if let Some(path) = &args.script {
        script = read_script_source(path)?;
    }

    for expr in &args.exprs {
        if !script.is_empty() && !script.ends_with('\n') {
            script.push('\n');
        }
        script.push_str(expr);
    }

    if args.script.is_none() && args.exprs.is_empty() {
        bail!("No statements given; use --script FILE or --expr STATEMENT");
    }

    Ok(script)
}

fn read_script_source(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read script from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))
    }
}

/// Summaries go to stderr so they never mix with FASTA on stdout
fn print_summary(summary: &ScriptSummary, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            eprintln!(
                "Ran {} statement(s), wrote {} record(s)",
                summary.statements, summary.records_written
            );
            if summary.skipped > 0 {
                eprintln!("Skipped {} statement(s) with invalid patterns", summary.skipped);
            }
        }
        OutputFormat::Json => {
            eprintln!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Tsv => {
            eprintln!("statements\trecords_written\tskipped");
            eprintln!(
                "{}\t{}\t{}",
                summary.statements, summary.records_written, summary.skipped
            );
        }
    }
    Ok(())
}
