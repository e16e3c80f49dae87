//! Sequence access helpers
//!
//! The aligners work in 1-based coordinates: position `i` of a sequence of
//! length `n` is valid for `1 <= i <= n`, and offsets such as "finish point"
//! or "start diagonal" are expressed in that frame.

use std::ops::Index;

/// A borrowed sequence addressed with 1-based signed positions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Bases<'a> {
    raw: &'a [u8],
}

impl<'a> Bases<'a> {
    pub fn new(raw: &'a [u8]) -> Self {
        Self { raw }
    }

    #[inline]
    pub fn len(&self) -> i64 {
        self.raw.len() as i64
    }
}

impl Index<i64> for Bases<'_> {
    type Output = u8;

    #[inline]
    fn index(&self, i: i64) -> &u8 {
        &self.raw[(i - 1) as usize]
    }
}

/// Complement a single nucleotide, preserving case. IUPAC ambiguity codes map
/// to their complementary code; anything else is returned unchanged.
pub fn complement_base(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        b'a' => b't',
        b't' => b'a',
        b'c' => b'g',
        b'g' => b'c',
        b'R' => b'Y',
        b'Y' => b'R',
        b'r' => b'y',
        b'y' => b'r',
        b'K' => b'M',
        b'M' => b'K',
        b'k' => b'm',
        b'm' => b'k',
        b'B' => b'V',
        b'V' => b'B',
        b'b' => b'v',
        b'v' => b'b',
        b'D' => b'H',
        b'H' => b'D',
        b'd' => b'h',
        b'h' => b'd',
        _ => base, // N, S, W and unknown symbols
    }
}

/// Reverse complement a DNA sequence
pub fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(seq.len());
    reverse_complement_into(seq, &mut out);
    out
}

/// Reverse complement `seq` into `out`, reusing its allocation.
pub fn reverse_complement_into(seq: &[u8], out: &mut Vec<u8>) {
    out.clear();
    out.extend(seq.iter().rev().map(|&base| complement_base(base)));
}
