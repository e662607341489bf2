//! Index builder: parallel header discovery and name resolution.
//!
//! A build runs in two phases:
//!
//! 1. **Scan**: the working file is split into partitions (see
//!    [`plan_partitions`]) and one boundary scanner per partition runs on a
//!    dedicated thread pool. The per-partition offset lists are joined,
//!    merged and sorted, so entry order never depends on which worker
//!    finished first.
//! 2. **Resolve**: each offset is visited in file order, its header line is
//!    read and split into name and description.
//!
//! Progress is reported once per scanned block and once per resolved header.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use noodles::fasta;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::engine::events::{EngineObserver, Progress};
use crate::index::scanner::{plan_partitions, scan_partition, ScanPartition};
use crate::index::store::{IndexEntry, SeqIndex, StoreError};
use crate::parsing::header::read_definition;

pub const SCAN_LABEL: &str = "Index the FASTA file...";
pub const RESOLVE_LABEL: &str = "Resolve the index and cache it...";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start scan workers: {0}")]
    ThreadPool(String),

    #[error("Failed to persist index: {0}")]
    Store(#[from] StoreError),
}

/// Builds a [`SeqIndex`] for one working file
pub struct IndexBuilder<'a> {
    path: &'a Path,
    threads: usize,
    block_size: usize,
    observer: &'a dyn EngineObserver,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(
        path: &'a Path,
        threads: usize,
        block_size: usize,
        observer: &'a dyn EngineObserver,
    ) -> Self {
        Self {
            path,
            threads: threads.max(1),
            block_size: block_size.max(1),
            observer,
        }
    }

    /// Scan and resolve the whole file
    ///
    /// # Errors
    ///
    /// Returns `BuildError::Io` for read failures or `BuildError::ThreadPool`
    /// if the scan workers cannot be started.
    pub fn build(&self) -> Result<SeqIndex, BuildError> {
        let file_len = std::fs::metadata(self.path)?.len();
        let partitions = plan_partitions(file_len, self.block_size, self.threads);

        info!(
            "Indexing {} ({} bytes, {} worker(s))",
            self.path.display(),
            file_len,
            partitions.len().max(1)
        );

        let offsets = self.scan(&partitions)?;
        let entries = self.resolve(&offsets)?;

        info!("Indexed {} record(s)", entries.len());
        Ok(SeqIndex::new(entries, file_len))
    }

    /// Build the index and write it to `index_path`
    ///
    /// # Errors
    ///
    /// Returns any build error, or `BuildError::Store` if saving fails.
    pub fn build_and_save(&self, index_path: &Path) -> Result<SeqIndex, BuildError> {
        let index = self.build()?;
        index.save_to_file(index_path)?;
        debug!("Saved index to {}", index_path.display());
        Ok(index)
    }

    /// Run one boundary scanner per partition and return all header offsets
    /// in ascending order.
    fn scan(&self, partitions: &[ScanPartition]) -> Result<Vec<u64>, BuildError> {
        if partitions.is_empty() {
            return Ok(Vec::new());
        }

        let total_blocks: usize = partitions.iter().map(|p| p.blocks).sum();
        let done = AtomicUsize::new(0);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(partitions.len())
            .thread_name(|i| format!("fasta-scan-{i}"))
            .build()
            .map_err(|e| BuildError::ThreadPool(e.to_string()))?;

        let per_partition = pool.install(|| {
            partitions
                .par_iter()
                .map(|partition| {
                    scan_partition(self.path, partition, self.block_size, || {
                        let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                        self.observer
                            .on_progress(SCAN_LABEL, Progress::of(finished, total_blocks));
                    })
                })
                .collect::<std::io::Result<Vec<Vec<u64>>>>()
        })?;

        let mut offsets: Vec<u64> = per_partition.into_iter().flatten().collect();
        offsets.sort_unstable();
        offsets.dedup();

        debug!("Found {} header(s) in {} block(s)", offsets.len(), total_blocks);
        Ok(offsets)
    }

    /// Read the definition line at every offset
    fn resolve(&self, offsets: &[u64]) -> Result<Vec<IndexEntry>, BuildError> {
        let mut reader = fasta::io::Reader::new(BufReader::new(File::open(self.path)?));
        let mut entries = Vec::with_capacity(offsets.len());

        for (i, &offset) in offsets.iter().enumerate() {
            reader.get_mut().seek(SeekFrom::Start(offset))?;

            let (name, description) = read_definition(&mut reader)?.unwrap_or_else(|| {
                warn!("Unreadable header at offset {offset}; indexing it without a name");
                (String::new(), String::new())
            });
            entries.push(IndexEntry {
                name,
                description,
                offset,
            });

            self.observer
                .on_progress(RESOLVE_LABEL, Progress::of(i + 1, offsets.len()));
        }

        Ok(entries)
    }
}
