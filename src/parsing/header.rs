//! FASTA definition lines.
//!
//! Headers are read and split with `noodles::fasta`; the scanner only finds
//! where they start.

use std::io::{self, BufRead};

use noodles::fasta::{self, record::Definition};

/// Split a definition line into its record name and description.
///
/// The line must start with `>` followed by a name; the line terminator is
/// optional. The description is the rest of the line with surrounding
/// whitespace removed, and may be empty. Returns `None` for anything that is
/// not a definition line.
#[must_use]
pub fn parse_definition(line: &str) -> Option<(String, String)> {
    let definition: Definition = line.trim_end_matches(['\n', '\r']).parse().ok()?;

    let name = String::from_utf8_lossy(definition.name()).into_owned();
    let description = definition
        .description()
        .map(|d| String::from_utf8_lossy(d).trim().to_string())
        .unwrap_or_default();

    Some((name, description))
}

/// Read the definition line at the reader's current position.
///
/// Returns `Ok(None)` at end of input, or when the line is not a valid
/// definition (no `>`, no name, or not UTF-8).
///
/// # Errors
///
/// Returns any I/O error other than invalid UTF-8 from the underlying reader.
pub fn read_definition<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> io::Result<Option<(String, String)>> {
    let mut line = String::new();
    match reader.read_definition(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(parse_definition(&line)),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => Ok(None),
        Err(e) => Err(e),
    }
}
