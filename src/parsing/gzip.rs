//! Gzip detection and one-shot extraction to a plain-text working copy.
//!
//! Compressed inputs are never scanned directly: the first member of the
//! gzip stream is written once to `<source>.txt` next to the source, and all
//! indexing and seeking happens on that copy.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;
use tracing::{debug, info};

use crate::engine::events::{EngineObserver, Progress};

/// Suffix appended to a compressed source to name its working copy
pub const WORKING_COPY_SUFFIX: &str = "txt";

const COPY_BLOCK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum DecompressError {
    #[error("Failed to decompress {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to publish working copy: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Check if the path names a gzip-compressed file
#[must_use]
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Path of the plain-text file that indexing and lookups read.
///
/// Plain-text sources are used as-is; compressed sources map to a sibling
/// `<source>.txt`.
#[must_use]
pub fn working_path_for(source: &Path) -> PathBuf {
    if is_gzipped(source) {
        append_suffix(source, WORKING_COPY_SUFFIX)
    } else {
        source.to_path_buf()
    }
}

/// Append `.suffix` to the full file name (`a.fa.gz` -> `a.fa.gz.txt`)
pub(crate) fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Extract a gzip-compressed `source` into `dest`.
///
/// The data is streamed into a temporary file in the destination directory
/// which is only renamed to `dest` once the whole member has been decoded, so
/// a corrupt archive never leaves a usable partial working copy behind.
///
/// Returns the number of decompressed bytes.
///
/// # Errors
///
/// Returns `DecompressError::Io` if the source cannot be read or is not valid
/// gzip, or `DecompressError::Persist` if the finished copy cannot be moved
/// into place.
pub fn decompress_to(
    source: &Path,
    dest: &Path,
    observer: &dyn EngineObserver,
) -> Result<u64, DecompressError> {
    info!("Extracting {} to {}", source.display(), dest.display());

    let io_err = |e| DecompressError::Io {
        path: source.to_path_buf(),
        source: e,
    };

    let file = File::open(source).map_err(io_err)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));

    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;

    let mut buf = vec![0u8; COPY_BLOCK_SIZE];
    let mut total: u64 = 0;
    loop {
        let n = decoder.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        temp.write_all(&buf[..n]).map_err(io_err)?;
        total += n as u64;
        observer.on_progress("Extracting the FASTA file...", Progress::Indeterminate);
    }
    temp.flush().map_err(io_err)?;

    temp.persist(dest)?;
    debug!("Extracted {total} bytes");
    Ok(total)
}
