//! Tokenizer and parser for extraction scripts.
//!
//! One statement per line. Each line is tokenized on whitespace and matched
//! against the statement forms in order:
//!
//! | Form | Tokens | Meaning |
//! |------|--------|---------|
//! | comment | blank, or first non-blank char is `#` | ignored |
//! | rename + range | `NEWNAME PATTERN START STOP` | slice every match and rename it |
//! | range | `PATTERN START STOP` | slice every match |
//! | pattern | anything else | emit every match unchanged |
//!
//! `START` and `STOP` are 1-based inclusive coordinates. A line that looks
//! like a range but has a non-numeric coordinate falls through to the
//! whole-line pattern form.

/// A parsed script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Blank line or `#` comment
    Comment,

    /// `NEWNAME PATTERN START STOP`
    RenameRange {
        new_name: String,
        pattern: String,
        start: usize,
        stop: usize,
    },

    /// `PATTERN START STOP`
    Range {
        pattern: String,
        start: usize,
        stop: usize,
    },

    /// The whole trimmed line used as a pattern
    Pattern(String),
}

impl Statement {
    /// The glob pattern this statement resolves, if any
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Self::Comment => None,
            Self::RenameRange { pattern, .. }
            | Self::Range { pattern, .. }
            | Self::Pattern(pattern) => Some(pattern.as_str()),
        }
    }
}

/// Parse a single script line
#[must_use]
pub fn parse_line(line: &str) -> Statement {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Statement::Comment;
    }

    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    if let [new_name, pattern, start, stop] = tokens.as_slice() {
        if let Some((start, stop)) = parse_coordinates(start, stop) {
            return Statement::RenameRange {
                new_name: (*new_name).to_string(),
                pattern: (*pattern).to_string(),
                start,
                stop,
            };
        }
    }

    if let [pattern, start, stop] = tokens.as_slice() {
        if let Some((start, stop)) = parse_coordinates(start, stop) {
            return Statement::Range {
                pattern: (*pattern).to_string(),
                start,
                stop,
            };
        }
    }

    Statement::Pattern(trimmed.to_string())
}

/// Parse a whole script, keeping one statement per input line
#[must_use]
pub fn parse_script(script: &str) -> Vec<Statement> {
    script.lines().map(parse_line).collect()
}

fn parse_coordinates(start: &str, stop: &str) -> Option<(usize, usize)> {
    Some((start.parse().ok()?, stop.parse().ok()?))
}
