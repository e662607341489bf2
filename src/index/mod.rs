//! FASTA offset index: building, persisting and querying.
//!
//! The index is an ordered list of `(name, description, offset)` entries, one
//! per header line, where `offset` is the position of the header's `>`. With
//! it, a record is retrieved by seeking straight to its header instead of
//! scanning the whole file.
//!
//! ## Building
//!
//! ```rust,no_run
//! use fasta_extract::engine::events::NoopObserver;
//! use fasta_extract::index::builder::IndexBuilder;
//! use fasta_extract::index::store::index_path_for;
//! use std::path::Path;
//!
//! let fasta = Path::new("genome.fa");
//! let index = IndexBuilder::new(fasta, 8, 10 * 1024 * 1024, &NoopObserver)
//!     .build_and_save(&index_path_for(fasta))
//!     .unwrap();
//! println!("{} records", index.len());
//! ```
//!
//! ## Querying
//!
//! ```rust,no_run
//! use fasta_extract::index::locator::RecordLocator;
//! use fasta_extract::index::store::SeqIndex;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let index = SeqIndex::load_from_file(Path::new("genome.fa.idx")).unwrap();
//! let locator = RecordLocator::open(Path::new("genome.fa"), Arc::new(index)).unwrap();
//!
//! let chr1 = locator.find_one("chr1").unwrap();
//! let scaffolds = locator.find_many("scaffold_*", false, false).unwrap();
//! ```
//!
//! ## Staleness
//!
//! A persisted index is trusted as-is. If the FASTA file changes after the
//! index was written, lookups may return wrong data or fail with a not-found
//! error until the index is rebuilt.

pub mod builder;
pub mod locator;
pub mod pattern;
pub mod scanner;
pub mod store;
