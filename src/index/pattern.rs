//! Shell-style glob patterns over record names and descriptions.
//!
//! Supported syntax, matched against the whole string:
//!
//! - `*` any run of characters, including none
//! - `?` exactly one character
//! - `[abc]`, `[a-z]` one character from the set
//! - `[!abc]` one character not in the set
//!
//! An unterminated `[` is an ordinary character. Everything else matches
//! itself.

use regex::{Regex, RegexBuilder};

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    pattern: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile `pattern`, optionally ignoring case
    ///
    /// # Errors
    ///
    /// Returns a `regex::Error` for patterns that cannot be expressed, such as
    /// a reversed character range `[z-a]`.
    pub fn new(pattern: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(&glob_to_regex(pattern))
            .case_insensitive(ignore_case)
            .build()?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

/// Translate a glob into an anchored regular expression
#[must_use]
pub fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::from("^(?s:");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => {
                while i < chars.len() && chars[i] == '*' {
                    i += 1;
                }
                out.push_str(".*");
            }
            '?' => {
                out.push('.');
                i += 1;
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push_str(&translate_class(&chars[i + 1..end]));
                    i = end + 1;
                }
                None => {
                    out.push_str(r"\[");
                    i += 1;
                }
            },
            c => {
                out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4])));
                i += 1;
            }
        }
    }

    out.push_str(")$");
    out
}

/// Index of the `]` closing the class opened at `open`, if any.
/// A `]` directly after `[` or `[!` is part of the set.
fn class_end(chars: &[char], open: usize) -> Option<usize> {
    let mut j = open + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    while j < chars.len() && chars[j] != ']' {
        j += 1;
    }
    (j < chars.len()).then_some(j)
}

fn translate_class(body: &[char]) -> String {
    let (negate, body) = match body.split_first() {
        Some(('!', rest)) => (true, rest),
        _ => (false, body),
    };

    let mut out = String::from(if negate { "[^" } else { "[" });
    let mut k = 0;
    while k < body.len() {
        out.push_str(&escape_char(body[k]));
        if k + 2 < body.len() && body[k + 1] == '-' {
            out.push('-');
            out.push_str(&escape_char(body[k + 2]));
            k += 3;
        } else {
            k += 1;
        }
    }
    out.push(']');
    out
}

fn escape_char(c: char) -> String {
    regex::escape(c.encode_utf8(&mut [0u8; 4]))
}
