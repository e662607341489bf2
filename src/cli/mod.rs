//! Command-line interface for fasta-extract.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **index**: Build (or load) the offset index of a FASTA file
//! - **extract**: Run an extraction script and write FASTA output
//! - **list**: Show the records recorded in the index
//!
//! ## Usage
//!
//! ```text
//! # Build the index once, with 8 scanners
//! fasta-extract index genome.fa.gz --threads 8
//!
//! # Run a script file, writing to a file
//! fasta-extract extract genome.fa.gz --script ids.txt --output picked.fa
//!
//! # Inline statements, printed to stdout
//! fasta-extract extract genome.fa -e "Baby Chr0 200 100" -e "chrM"
//!
//! # Which records match a pattern?
//! fasta-extract list genome.fa --pattern 'scaffold_*' --format tsv
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::engine::config::{EngineConfig, DEFAULT_BLOCK_SIZE};
use crate::engine::events::TracingObserver;
use crate::engine::{BuildSummary, EngineError, FastaEngine};

pub mod extract;
pub mod index;
pub mod list;

#[derive(Parser)]
#[command(name = "fasta-extract")]
#[command(version)]
#[command(about = "Index large FASTA files and extract records with a small script language")]
#[command(
    long_about = "fasta-extract indexes the header lines of a (optionally gzip-compressed) FASTA file in parallel and stores the offsets next to the file.\n\nExtraction scripts then name records or ranges, one per line:\n- NAME_OR_GLOB                  whole records\n- NAME_OR_GLOB START STOP       1-based inclusive range\n- NEWNAME NAME_OR_GLOB START STOP  range, renamed\nA START greater than STOP yields the reverse complement."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for summaries and listings
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build or load the index of a FASTA file
    Index(index::IndexArgs),

    /// Extract records from a FASTA file with a script
    Extract(extract::ExtractArgs),

    /// List the records in a FASTA file's index
    List(list::ListArgs),
}

/// Options shared by every command that opens a FASTA file
#[derive(Args, Clone)]
pub struct SourceArgs {
    /// Input FASTA file (plain or gzip-compressed)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Number of parallel scanners used when building the index
    /// (defaults to the number of CPUs)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Bytes read per scanner block
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// Ignore any existing index and build a new one
    #[arg(long)]
    pub rebuild: bool,
}

impl SourceArgs {
    fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            threads: self.threads.unwrap_or(defaults.threads),
            block_size: self.block_size,
            rebuild: self.rebuild,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Open the input and wait until its index is usable.
///
/// Returns the engine and, when a build had to run, its summary.
fn open_ready_engine(
    args: &SourceArgs,
    verbose: bool,
) -> anyhow::Result<(FastaEngine, Option<BuildSummary>)> {
    let engine = FastaEngine::open(&args.input, args.engine_config(), Arc::new(TracingObserver))?;

    let runtime = tokio::runtime::Runtime::new()?;
    let summary = runtime.block_on(async {
        match engine.initialize()? {
            Some(build) => build.wait().await.map(Some),
            None => Ok::<_, EngineError>(None),
        }
    })?;

    if verbose {
        if let Some(summary) = &summary {
            eprintln!(
                "Indexed {} record(s) in {:.2?}",
                summary.records, summary.elapsed
            );
        }
    }

    Ok((engine, summary))
}
