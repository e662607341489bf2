//! Core sequence types.
//!
//! - [`SequenceRecord`](record::SequenceRecord): a named sequence with its
//!   description and data, supporting slicing, complementing and formatting
//! - [`complement`]: the fixed nucleotide complement table
//!
//! ## Reverse complement
//!
//! A reverse complement is always two explicit steps: a slice with
//! `start > stop` reverses the selected symbols, and a separate
//! [`complement`](record::SequenceRecord::complement) call swaps bases.
//!
//! ```rust
//! use fasta_extract::core::record::SequenceRecord;
//!
//! let mut rec = SequenceRecord::new("chr1", "", b"AACCGGTA".to_vec());
//! rec.slice(8, 1);
//! rec.complement();
//! assert_eq!(rec.data, b"TACCGGTT");
//! ```

pub mod complement;
pub mod record;
