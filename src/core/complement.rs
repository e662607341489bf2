//! Nucleotide complement table.
//!
//! Covers the symbols that the extraction scripts are expected to see:
//!
//! | Symbol | Complement |
//! |--------|------------|
//! | A / a  | T / t      |
//! | T / t  | A / a      |
//! | C / c  | G / g      |
//! | G / g  | C / c      |
//! | U / u  | A / a      |
//! | R / r  | Y / y      |
//! | Y / y  | R / r      |
//!
//! Every other byte maps to itself.

const COMPLEMENT_TABLE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        #[allow(clippy::cast_possible_truncation)] // i < 256
        {
            table[i] = i as u8;
        }
        i += 1;
    }

    table[b'A' as usize] = b'T';
    table[b'T' as usize] = b'A';
    table[b'C' as usize] = b'G';
    table[b'G' as usize] = b'C';
    table[b'a' as usize] = b't';
    table[b't' as usize] = b'a';
    table[b'c' as usize] = b'g';
    table[b'g' as usize] = b'c';

    // RNA uracil pairs with adenine; the reverse direction stays A -> T
    table[b'U' as usize] = b'A';
    table[b'u' as usize] = b'a';

    // Purine / pyrimidine ambiguity codes
    table[b'R' as usize] = b'Y';
    table[b'Y' as usize] = b'R';
    table[b'r' as usize] = b'y';
    table[b'y' as usize] = b'r';

    table
};

/// Complement a single symbol. Unmapped symbols are returned unchanged.
#[inline]
#[must_use]
pub fn complement_base(base: u8) -> u8 {
    COMPLEMENT_TABLE[base as usize]
}

/// Complement every symbol of `seq` in place, keeping the symbol order.
pub fn complement_in_place(seq: &mut [u8]) {
    for base in seq.iter_mut() {
        *base = complement_base(*base);
    }
}
