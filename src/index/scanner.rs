//! Boundary scanning: finding the byte offsets of FASTA header lines.
//!
//! The file is cut into fixed-size blocks and the blocks are split into
//! contiguous, non-overlapping partitions, one per worker. Each worker reads
//! its own blocks through its own file handle, so every byte is examined by
//! exactly one worker.
//!
//! A `>` only counts as a header start when it is the first byte of the file
//! or directly follows a `\n`. Workers look one byte back across block and
//! partition edges to make that decision.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// A contiguous run of blocks assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPartition {
    /// Absolute byte offset of the first block
    pub start: u64,
    /// Number of blocks to read
    pub blocks: usize,
}

/// Split a file of `file_len` bytes into at most `workers` partitions.
///
/// Blocks are distributed evenly and the remainder goes to the last
/// partition, so the partition sizes always add up to `ceil(file_len /
/// block_size)`. When `workers * block_size` exceeds the file length a single
/// partition is returned. An empty file yields no partitions.
#[must_use]
pub fn plan_partitions(file_len: u64, block_size: usize, workers: usize) -> Vec<ScanPartition> {
    if file_len == 0 || block_size == 0 {
        return Vec::new();
    }

    let block = block_size as u64;
    let total_blocks = file_len.div_ceil(block);

    let requested = workers.max(1) as u64;
    let workers = if requested.saturating_mul(block) > file_len {
        1
    } else {
        requested
    };

    let per_worker = total_blocks / workers;
    let mut partitions = Vec::with_capacity(usize::try_from(workers).unwrap_or(1));
    let mut next_block = 0u64;
    for i in 0..workers {
        let mut blocks = per_worker;
        if i == workers - 1 {
            blocks += total_blocks - per_worker * workers;
        }
        partitions.push(ScanPartition {
            start: next_block * block,
            blocks: usize::try_from(blocks).unwrap_or(usize::MAX),
        });
        next_block += blocks;
    }

    partitions
}

/// Find header starts within `buf`, which begins at absolute offset `base`.
///
/// `prev` is the byte just before `buf` in the file, or `None` when `buf`
/// starts at offset 0.
#[must_use]
pub fn find_header_starts(buf: &[u8], base: u64, prev: Option<u8>) -> Vec<u64> {
    let mut offsets = Vec::new();
    for (i, &byte) in buf.iter().enumerate() {
        if byte != b'>' {
            continue;
        }
        let at_line_start = if i == 0 {
            prev.map_or(true, |p| p == b'\n')
        } else {
            buf[i - 1] == b'\n'
        };
        if at_line_start {
            offsets.push(base + i as u64);
        }
    }
    offsets
}

/// Scan one partition of `path` and return the header offsets found in it.
///
/// `on_block` is called after every block read. Scanning stops early when the
/// file ends before the block quota is used up.
///
/// # Errors
///
/// Returns any I/O error from opening, seeking or reading the file.
pub fn scan_partition<F: FnMut()>(
    path: &Path,
    partition: &ScanPartition,
    block_size: usize,
    mut on_block: F,
) -> io::Result<Vec<u64>> {
    let mut file = File::open(path)?;

    let mut prev = if partition.start == 0 {
        None
    } else {
        file.seek(SeekFrom::Start(partition.start - 1))?;
        let mut byte = [0u8; 1];
        file.read_exact(&mut byte)?;
        Some(byte[0])
    };
    file.seek(SeekFrom::Start(partition.start))?;

    let mut offsets = Vec::new();
    let mut buf = vec![0u8; block_size];
    let mut pos = partition.start;

    for _ in 0..partition.blocks {
        let n = read_block(&mut file, &mut buf)?;
        if n == 0 {
            break;
        }
        offsets.extend(find_header_starts(&buf[..n], pos, prev));
        prev = Some(buf[n - 1]);
        pos += n as u64;
        on_block();
    }

    Ok(offsets)
}

/// Fill `buf` as far as the reader allows; short only at end of file
fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
