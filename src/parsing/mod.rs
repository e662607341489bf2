//! Parsers for the text inputs the engine consumes.
//!
//! - **FASTA definition lines**: read with noodles and split into record name
//!   and description
//! - **Gzip sources**: detection and extraction to a plain-text working copy
//! - **Extraction scripts**: one statement per line (see [`script`])
//!
//! ## Example
//!
//! ```rust
//! use fasta_extract::parsing::script::{parse_line, Statement};
//!
//! let stmt = parse_line("Baby Chr0 200 100");
//! assert!(matches!(stmt, Statement::RenameRange { start: 200, stop: 100, .. }));
//! ```

pub mod gzip;
pub mod header;
pub mod script;
