//! Record lookups against a loaded index.
//!
//! Offsets are trusted as they are: an index built for an older version of
//! the file seeks to the wrong place. Such lookups log a warning and return
//! whatever follows the offset, and names that only exist in the new file
//! are reported as not found. Rebuild the index after changing the file.

use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use noodles::fasta;
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::record::SequenceRecord;
use crate::index::pattern::GlobPattern;
use crate::index::store::{IndexEntry, SeqIndex};
use crate::parsing::header::read_definition;

#[derive(Error, Debug)]
pub enum LocateError {
    #[error("Cannot find sequence '{name}'. Maybe the index is out of date? Try rebuilding it.")]
    NotFound { name: String },

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Retrieves records from the working file by seeking to indexed offsets
///
/// The locator owns one read handle. Each retrieval is a seek followed by a
/// run of reads, so the handle sits behind a mutex and concurrent lookups on
/// the same locator are serialized.
pub struct RecordLocator {
    path: PathBuf,
    index: Arc<SeqIndex>,
    reader: Mutex<BufReader<File>>,
}

impl RecordLocator {
    /// Open `path` for lookups against `index`
    ///
    /// # Errors
    ///
    /// Returns `LocateError::Io` if the working file cannot be opened.
    pub fn open(path: &Path, index: Arc<SeqIndex>) -> Result<Self, LocateError> {
        let file = File::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            index,
            reader: Mutex::new(BufReader::new(file)),
        })
    }

    pub fn index(&self) -> &SeqIndex {
        &self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Retrieve the first record whose name is exactly `name`
    ///
    /// # Errors
    ///
    /// Returns `LocateError::NotFound` if no index entry has that name, or
    /// `LocateError::Io` if reading the record fails.
    pub fn find_one(&self, name: &str) -> Result<SequenceRecord, LocateError> {
        let entry = self.index.get(name).ok_or_else(|| LocateError::NotFound {
            name: name.to_string(),
        })?;
        self.read_record(entry)
    }

    /// Retrieve every record whose name (or, with `match_description`, whose
    /// description) matches the glob `pattern`, in index order.
    ///
    /// No match is an empty result, not an error.
    ///
    /// # Errors
    ///
    /// Returns `LocateError::InvalidPattern` if the glob cannot be compiled, or
    /// `LocateError::Io` if reading a record fails.
    pub fn find_many(
        &self,
        pattern: &str,
        match_description: bool,
        ignore_case: bool,
    ) -> Result<Vec<SequenceRecord>, LocateError> {
        let glob = compile(pattern, ignore_case)?;
        let records = self
            .matching_entries(&glob, match_description)
            .map(|entry| self.read_record(entry))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Pattern '{pattern}' matched {} record(s)", records.len());
        Ok(records)
    }

    /// Index entries matching `glob`, in index order, without reading data
    pub fn matching_entries<'a>(
        &'a self,
        glob: &'a GlobPattern,
        match_description: bool,
    ) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.index.iter().filter(move |entry| {
            glob.is_match(&entry.name) || (match_description && glob.is_match(&entry.description))
        })
    }

    /// Seek to an entry, read its definition line and gather sequence lines
    /// until the next header or end of file.
    fn read_record(&self, entry: &IndexEntry) -> Result<SequenceRecord, LocateError> {
        // Every read re-seeks first, so a poisoned handle is still usable
        let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        reader.seek(SeekFrom::Start(entry.offset))?;

        let mut fasta_reader = fasta::io::Reader::new(&mut *reader);
        if read_definition(&mut fasta_reader)?.is_none() {
            warn!(
                "No header at offset {} for '{}'; the index may be stale",
                entry.offset, entry.name
            );
        }

        let mut data = Vec::new();
        fasta_reader.read_sequence(&mut data)?;

        Ok(SequenceRecord::new(
            entry.name.clone(),
            entry.description.clone(),
            data,
        ))
    }
}

/// Compile a glob, mapping failures to `LocateError::InvalidPattern`
///
/// # Errors
///
/// Returns `LocateError::InvalidPattern` when the glob cannot be expressed.
pub fn compile(pattern: &str, ignore_case: bool) -> Result<GlobPattern, LocateError> {
    GlobPattern::new(pattern, ignore_case).map_err(|source| LocateError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FASTA: &[u8] = b">chr1 first chromosome\nACGTACGT\nACGT\n>chr2 second\r\nGGGG\r\nCC\r\n>scaffold_1 unplaced chr\nTTTT\n";

    fn locator() -> (NamedTempFile, RecordLocator) {
        let mut temp = NamedTempFile::with_suffix(".fa").unwrap();
        temp.write_all(FASTA).unwrap();
        temp.flush().unwrap();

        let index = SeqIndex::new(
            vec![
                IndexEntry {
                    name: "chr1".to_string(),
                    description: "first chromosome".to_string(),
                    offset: 0,
                },
                IndexEntry {
                    name: "chr2".to_string(),
                    description: "second".to_string(),
                    offset: 37,
                },
                IndexEntry {
                    name: "scaffold_1".to_string(),
                    description: "unplaced chr".to_string(),
                    offset: 61,
                },
            ],
            FASTA.len() as u64,
        );
        let locator = RecordLocator::open(temp.path(), Arc::new(index)).unwrap();
        (temp, locator)
    }

    #[test]
    fn test_fixture_offsets() {
        assert_eq!(FASTA[37], b'>');
        assert_eq!(FASTA[61], b'>');
    }

    #[test]
    fn test_find_one() {
        let (_temp, locator) = locator();
        let rec = locator.find_one("chr1").unwrap();
        assert_eq!(rec.name, "chr1");
        assert_eq!(rec.description, "first chromosome");
        assert_eq!(rec.data, b"ACGTACGTACGT");
    }

    #[test]
    fn test_find_one_strips_crlf() {
        let (_temp, locator) = locator();
        let rec = locator.find_one("chr2").unwrap();
        assert_eq!(rec.data, b"GGGGCC");
    }

    #[test]
    fn test_find_one_last_record_reads_to_eof() {
        let (_temp, locator) = locator();
        let rec = locator.find_one("scaffold_1").unwrap();
        assert_eq!(rec.data, b"TTTT");
    }

    #[test]
    fn test_find_one_not_found() {
        let (_temp, locator) = locator();
        let err = locator.find_one("chrX").unwrap_err();
        assert!(matches!(err, LocateError::NotFound { ref name } if name == "chrX"));
        assert!(err.to_string().contains("out of date"));
    }

    #[test]
    fn test_find_many_in_index_order() {
        let (_temp, locator) = locator();
        let names: Vec<String> = locator
            .find_many("*", false, false)
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["chr1", "chr2", "scaffold_1"]);
    }

    #[test]
    fn test_find_many_no_match_is_empty() {
        let (_temp, locator) = locator();
        assert!(locator.find_many("chrY*", false, false).unwrap().is_empty());
    }

    #[test]
    fn test_find_many_ignore_case() {
        let (_temp, locator) = locator();
        assert!(locator.find_many("CHR1", false, false).unwrap().is_empty());
        let found = locator.find_many("CHR1", false, true).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "chr1");
    }

    #[test]
    fn test_find_many_matches_description() {
        let (_temp, locator) = locator();
        assert!(locator.find_many("*chr", false, false).unwrap().is_empty());
        let found = locator.find_many("*chr", true, false).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "scaffold_1");
    }

    #[test]
    fn test_find_many_invalid_pattern() {
        let (_temp, locator) = locator();
        let result = locator.find_many("[z-a]", false, false);
        assert!(matches!(result, Err(LocateError::InvalidPattern { .. })));
    }
}
