use crate::core::complement::complement_in_place;

/// Default wrap width for formatted sequence lines
pub const DEFAULT_LINE_WIDTH: usize = 80;

/// A single sequence materialized from a FASTA file
///
/// Records are created by the record locator, transformed in place by a
/// script statement (rename, slice, complement) and written out once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// First whitespace-delimited token of the header line
    pub name: String,

    /// Remainder of the header line, possibly empty
    pub description: String,

    /// Concatenated sequence lines without line terminators
    pub data: Vec<u8>,
}

impl SequenceRecord {
    pub fn new(name: impl Into<String>, description: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            data,
        }
    }

    /// Number of symbols in the record
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Select a 1-based, inclusive range of the data.
    ///
    /// With `start <= stop` the range is kept in its original orientation.
    /// With `start > stop` the range `stop..=start` is selected and its order
    /// reversed; the symbols themselves are not complemented.
    ///
    /// Coordinates are clamped to the data: 0 behaves like 1 and positions
    /// past the end are cut off.
    pub fn slice(&mut self, start: usize, stop: usize) {
        if start <= stop {
            let range = clamp_range(start, stop, self.data.len());
            self.data = self.data[range].to_vec();
        } else {
            let range = clamp_range(stop, start, self.data.len());
            self.data = self.data[range].iter().rev().copied().collect();
        }
    }

    /// Complement every symbol in place without changing their order
    pub fn complement(&mut self) {
        complement_in_place(&mut self.data);
    }

    /// Render the record as FASTA text.
    ///
    /// The header is `>name description` (just `>name` when the description
    /// is empty), followed by the data wrapped at `line_width` symbols. No
    /// trailing newline is emitted after the last data line. Data bytes are
    /// copied unchanged, whatever their encoding.
    #[must_use]
    pub fn format(&self, line_width: usize) -> Vec<u8> {
        let width = line_width.max(1);
        let mut out = Vec::with_capacity(
            self.name.len() + self.description.len() + self.data.len() + self.data.len() / width + 3,
        );

        out.push(b'>');
        out.extend_from_slice(self.name.as_bytes());
        if !self.description.is_empty() {
            out.push(b' ');
            out.extend_from_slice(self.description.as_bytes());
        }
        out.push(b'\n');

        for (i, chunk) in self.data.chunks(width).enumerate() {
            if i > 0 {
                out.push(b'\n');
            }
            out.extend_from_slice(chunk);
        }

        out
    }
}

/// Convert an inclusive 1-based `lo..=hi` into a 0-based half-open range
/// that is always valid for a slice of `len` elements.
fn clamp_range(lo: usize, hi: usize, len: usize) -> std::ops::Range<usize> {
    let begin = lo.saturating_sub(1).min(len);
    let end = hi.min(len);
    if begin >= end {
        begin..begin
    } else {
        begin..end
    }
}
