//! # fasta-extract
//!
//! Index large FASTA files once, then pull records, ranges and reverse
//! complements out of them with a small line-oriented script.
//!
//! Scanning a multi-gigabyte FASTA file for one record is slow. `fasta-extract`
//! finds every header line with a pool of parallel scanners, stores the
//! header offsets in a JSON index next to the file, and afterwards seeks
//! directly to the records a script asks for.
//!
//! ## Features
//!
//! - **Parallel indexing**: the file is split into disjoint block ranges, one
//!   scanner per worker
//! - **Persisted index**: re-opening a file loads `<file>.idx` instead of
//!   scanning again
//! - **Gzip input**: compressed files are extracted once to a plain-text copy
//! - **Glob queries**: `*`, `?` and `[...]` over names and, optionally,
//!   descriptions
//! - **Range extraction**: 1-based inclusive ranges; reversed coordinates give
//!   the reverse complement
//!
//! ## Script language
//!
//! ```text
//! # comment
//! chr1                  whole record(s) matching the pattern
//! chr1 100 200          positions 100-200
//! Baby chr1 200 100     reverse complement of 100-200, renamed to Baby
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use fasta_extract::{EngineConfig, ExtractOptions, FastaEngine, NoopObserver};
//! use std::sync::Arc;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let engine = FastaEngine::open("genome.fa", EngineConfig::default(), Arc::new(NoopObserver))?;
//! if let Some(build) = engine.initialize()? {
//!     build.wait().await?;
//! }
//!
//! let mut out = std::io::stdout();
//! engine.run_script("Baby chr1 200 100", ExtractOptions::default(), &mut out)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`core`](crate::core): Sequence records and the complement table
//! - [`index`]: Boundary scanning, index building, persistence and lookups
//! - [`parsing`]: Header lines, gzip sources and scripts
//! - [`engine`]: The engine facade, configuration, notifications and the
//!   script interpreter
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod engine;
pub mod index;
pub mod parsing;

// Re-export commonly used types for convenience
pub use crate::core::record::SequenceRecord;
pub use engine::config::{EngineConfig, ExtractOptions};
pub use engine::events::{
    ChannelObserver, EngineEvent, EngineObserver, EngineState, NoopObserver, Progress,
    TracingObserver,
};
pub use engine::interpreter::ScriptSummary;
pub use engine::{BuildSummary, EngineError, FastaEngine};
pub use index::locator::RecordLocator;
pub use index::store::{IndexEntry, SeqIndex};
