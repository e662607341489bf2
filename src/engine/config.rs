use std::num::NonZeroUsize;

use thiserror::Error;

use crate::core::record::DEFAULT_LINE_WIDTH;

/// Size of each block read by a boundary scanner (10 MiB)
pub const DEFAULT_BLOCK_SIZE: usize = 10 * 1024 * 1024;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Worker count must be at least 1")]
    ZeroThreads,

    #[error("Scan block size must be at least 1 byte")]
    ZeroBlockSize,

    #[error("Line width must be at least 1")]
    ZeroLineWidth,
}

/// Configuration for opening and indexing a FASTA file
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of boundary scanners used for an index build
    pub threads: usize,

    /// Bytes read per scanner block
    pub block_size: usize,

    /// Ignore any persisted index (and working copy) and build from scratch
    pub rebuild: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: std::thread::available_parallelism().map_or(1, NonZeroUsize::get),
            block_size: DEFAULT_BLOCK_SIZE,
            rebuild: false,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first field that is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::ZeroThreads);
        }
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        Ok(())
    }
}

/// How script patterns are matched and results are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Also match patterns against record descriptions
    pub match_description: bool,

    /// Case-insensitive pattern matching
    pub ignore_case: bool,

    /// Wrap width of emitted sequence lines
    pub line_width: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            match_description: false,
            ignore_case: false,
            line_width: DEFAULT_LINE_WIDTH,
        }
    }
}

impl ExtractOptions {
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroLineWidth` for a zero wrap width.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.line_width == 0 {
            return Err(ConfigError::ZeroLineWidth);
        }
        Ok(())
    }
}
