use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::parsing::gzip::append_suffix;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No index found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read or write index: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse index: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to publish index: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Index file format version for compatibility checking
pub const INDEX_VERSION: &str = "1.0.0";

/// Suffix appended to the source path to name its index file
pub const INDEX_SUFFIX: &str = "idx";

/// Location of a single record in the working file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Record name (first token of the header)
    pub name: String,

    /// Rest of the header line
    #[serde(rename = "desc")]
    pub description: String,

    /// Byte offset of the `>` that starts the header line
    pub offset: u64,
}

/// Serializable index format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexData {
    pub version: String,
    pub created_at: String,
    /// Length of the working file the index was built from
    #[serde(default)]
    pub source_len: u64,
    pub entries: Vec<IndexEntry>,
}

/// Ordered header offsets of one FASTA file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeqIndex {
    /// Entries in ascending offset order
    pub entries: Vec<IndexEntry>,

    /// Length of the working file when the index was built
    pub source_len: u64,
}

/// Path of the index file kept next to `source` (`genome.fa` -> `genome.fa.idx`)
#[must_use]
pub fn index_path_for(source: &Path) -> PathBuf {
    append_suffix(source, INDEX_SUFFIX)
}

impl SeqIndex {
    pub fn new(entries: Vec<IndexEntry>, source_len: u64) -> Self {
        Self {
            entries,
            source_len,
        }
    }

    /// Load an index from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no file at `path`, or an
    /// I/O or parse error if it cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        Self::from_json(&content)
    }

    /// Parse an index from JSON
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Parse` if the JSON does not describe an index.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let data: IndexData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != INDEX_VERSION {
            warn!(
                "Index version mismatch (expected {}, found {})",
                INDEX_VERSION, data.version
            );
        }

        Ok(Self::new(data.entries, data.source_len))
    }

    /// Export the index to JSON
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Parse` if serialization fails.
    pub fn to_json(&self) -> Result<String, StoreError> {
        let data = IndexData {
            version: INDEX_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            source_len: self.source_len,
            entries: self.entries.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Write the index to `path`, replacing any previous file atomically
    ///
    /// # Errors
    ///
    /// Returns an I/O, serialization or persist error.
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.to_json()?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(path)?;
        Ok(())
    }

    /// First entry with exactly this name
    pub fn get(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    /// Number of records in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
