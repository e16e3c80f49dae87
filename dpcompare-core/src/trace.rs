//! Edit scripts and alignment rendering
//!
//! An edit script lists the gaps of an alignment in order. A positive entry
//! `j` places a gap in B just before B position `j` (a base of A is aligned
//! to nothing); a negative entry `-i` places a gap in A just before A
//! position `i`. Substitutions are implicit. Positions are 1-based.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::seq::{reverse_complement, Bases};
use crate::types::Overlap;

/// Ordered gap positions of an alignment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript(Vec<i64>);

impl EditScript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_entries(entries: Vec<i64>) -> Self {
        Self(entries)
    }

    /// Read a script in the 0-terminated form; anything after the first 0
    /// is ignored.
    pub fn from_zero_terminated(entries: &[i64]) -> Self {
        Self(entries.iter().copied().take_while(|&c| c != 0).collect())
    }

    /// The script followed by a terminating 0.
    pub fn to_zero_terminated(&self) -> Vec<i64> {
        let mut out = Vec::with_capacity(self.0.len() + 1);
        out.extend_from_slice(&self.0);
        out.push(0);
        out
    }

    pub fn entries(&self) -> &[i64] {
        &self.0
    }

    pub fn into_entries(self) -> Vec<i64> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn push(&mut self, entry: i64) {
        self.0.push(entry);
    }

    pub(crate) fn entries_mut(&mut self) -> &mut Vec<i64> {
        &mut self.0
    }
}

impl From<Vec<i64>> for EditScript {
    fn from(entries: Vec<i64>) -> Self {
        Self(entries)
    }
}

/// Column counts of an alignment replayed from an edit script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    pub matches: i64,
    pub mismatches: i64,
    /// Columns where A has a base and B a gap
    pub a_only: i64,
    /// Columns where B has a base and A a gap
    pub b_only: i64,
}

impl AlignmentSummary {
    /// Total discrepancies: mismatches plus gap columns.
    pub fn diffs(&self) -> i64 {
        self.mismatches + self.a_only + self.b_only
    }

    pub fn columns(&self) -> i64 {
        self.matches + self.diffs()
    }
}

/// Replay `script` over `a` and `b` starting on diagonal `begin` and count
/// the aligned columns up to the end of either sequence. Symbols are compared
/// case-insensitively.
pub fn summarize(a: &[u8], b: &[u8], begin: i64, script: &EditScript) -> AlignmentSummary {
    let a = Bases::new(a);
    let b = Bases::new(b);
    let (mut i, mut j) = if begin > 0 { (begin + 1, 1) } else { (1, 1 - begin) };
    let mut summary = AlignmentSummary::default();

    let column = |i: i64, j: i64, summary: &mut AlignmentSummary| {
        if a[i].eq_ignore_ascii_case(&b[j]) {
            summary.matches += 1;
        } else {
            summary.mismatches += 1;
        }
    };

    for &c in script.entries() {
        if c < 0 {
            while i < -c {
                column(i, j, &mut summary);
                i += 1;
                j += 1;
            }
            summary.b_only += 1;
            j += 1;
        } else {
            while j < c {
                column(i, j, &mut summary);
                i += 1;
                j += 1;
            }
            summary.a_only += 1;
            i += 1;
        }
    }
    while i <= a.len() && j <= b.len() {
        column(i, j, &mut summary);
        i += 1;
        j += 1;
    }
    summary
}

const PRINT_WIDTH: usize = 50;
const MAX_OVERHANG: i64 = 25;

/// Two-line text picture of an overlap.
///
/// The header sketches the overlap shape with its offsets and error rate.
/// If the overlap carries a trace the aligned bases follow in rows of 50
/// columns, with at most 25 unaligned bases shown at either end.
pub struct OverlapReport<'a> {
    pub a: &'a [u8],
    /// B as given to the comparison, before any reverse complement.
    pub b: &'a [u8],
    pub overlap: &'a Overlap,
}

impl<'a> OverlapReport<'a> {
    pub fn new(a: &'a [u8], b: &'a [u8], overlap: &'a Overlap) -> Self {
        Self { a, b, overlap }
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ovl = self.overlap;
        let (sym1, sym2) = if ovl.reverse_complement { ('<', '-') } else { ('-', '>') };
        let rate = format!(
            "dif/len = {}/{} = {:5.2}%",
            ovl.diffs,
            ovl.length,
            100.0 * ovl.error_rate()
        );
        let (beg, end) = (ovl.begin_offset, ovl.end_offset);

        if beg >= 0 {
            if end <= 0 {
                writeln!(f, "  A -----+------+---->    {}", rate)?;
                writeln!(f, "  B {:4} {}------{} {:<4}", beg, sym1, sym2, -end)?;
            } else {
                writeln!(f, "  A -----+------> {:<4}       {}", end, rate)?;
                writeln!(f, "  B {:4} {}------+----{}", beg, sym1, sym2)?;
            }
        } else if end >= 0 {
            writeln!(f, "  A {:4} -------> {:<4}       {}", -beg, end, rate)?;
            writeln!(f, "  B {}----+------+----{}", sym1, sym2)?;
        } else {
            writeln!(f, "  A {:4} -------+----> A    {}", -beg, rate)?;
            writeln!(f, "  B {}----+------{} {:<4}", sym1, sym2, -end)?;
        }
        writeln!(f)
    }
}

/// Accumulates alignment columns and flushes them in fixed-width rows.
struct ColumnWriter {
    top: String,
    bottom: String,
}

impl ColumnWriter {
    fn new() -> Self {
        Self {
            top: String::with_capacity(PRINT_WIDTH),
            bottom: String::with_capacity(PRINT_WIDTH),
        }
    }

    fn column(&mut self, f: &mut fmt::Formatter<'_>, x: u8, y: u8) -> fmt::Result {
        if self.top.len() >= PRINT_WIDTH {
            write!(f, "\n\t{}\n\t{}\n", self.top, self.bottom)?;
            self.top.clear();
            self.bottom.clear();
        }
        self.top.push(x as char);
        self.bottom.push(y as char);
        Ok(())
    }

    fn finish(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\n\t{}\n\t{}\n", self.top, self.bottom)
    }
}

fn write_alignment(
    f: &mut fmt::Formatter<'_>,
    a: &[u8],
    b: &[u8],
    mut prefix: i64,
    suffix: i64,
    script: &EditScript,
) -> fmt::Result {
    let a = Bases::new(a);
    let b = Bases::new(b);
    let mut out = ColumnWriter::new();
    let (mut i, mut j) = (1i64, 1i64);

    if prefix > MAX_OVERHANG {
        i = prefix - (MAX_OVERHANG - 1);
        prefix = MAX_OVERHANG;
    } else if prefix < -MAX_OVERHANG {
        j = -prefix - (MAX_OVERHANG - 1);
        prefix = -MAX_OVERHANG;
    }

    if prefix > 0 {
        for _ in 0..prefix {
            out.column(f, a[i], b' ')?;
            i += 1;
        }
    } else {
        for _ in 0..-prefix {
            out.column(f, b' ', b[j])?;
            j += 1;
        }
    }

    for &c in script.entries() {
        if c < 0 {
            while i != -c {
                out.column(f, a[i], b[j])?;
                i += 1;
                j += 1;
            }
            out.column(f, b'-', b[j])?;
            j += 1;
        } else {
            while j != c {
                out.column(f, a[i], b[j])?;
                i += 1;
                j += 1;
            }
            out.column(f, a[i], b'-')?;
            i += 1;
        }
    }

    let suffix = suffix.abs().min(MAX_OVERHANG);
    while i <= a.len() && j <= b.len() {
        out.column(f, a[i], b[j])?;
        i += 1;
        j += 1;
    }
    let mut shown = 0;
    while i <= a.len() && shown < suffix {
        out.column(f, a[i], b' ')?;
        i += 1;
        shown += 1;
    }
    while j <= b.len() && shown < suffix {
        out.column(f, b' ', b[j])?;
        j += 1;
        shown += 1;
    }

    out.finish(f)
}

impl fmt::Display for OverlapReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_header(f)?;

        let ovl = self.overlap;
        if let Some(script) = &ovl.trace {
            if ovl.reverse_complement {
                let b = reverse_complement(self.b);
                write_alignment(f, self.a, &b, ovl.begin_offset, ovl.end_offset, script)?;
            } else {
                write_alignment(f, self.a, self.b, ovl.begin_offset, ovl.end_offset, script)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlap(begin: i64, end: i64, trace: Option<Vec<i64>>) -> Overlap {
        Overlap {
            begin_offset: begin,
            end_offset: end,
            diffs: 0,
            length: 8,
            reverse_complement: false,
            trace: trace.map(EditScript::from),
        }
    }

    #[test]
    fn test_zero_terminated_forms() {
        let script = EditScript::from_entries(vec![5, -7, 12]);
        assert_eq!(script.to_zero_terminated(), vec![5, -7, 12, 0]);
        assert_eq!(EditScript::from_zero_terminated(&[5, -7, 12, 0, 99]), script);
        assert!(EditScript::from_zero_terminated(&[0]).is_empty());
    }

    #[test]
    fn test_serde_transparent() {
        let script = EditScript::from_entries(vec![3, -4]);
        assert_eq!(serde_json::to_string(&script).unwrap(), "[3,-4]");
    }

    #[test]
    fn test_summarize_gaps_and_mismatches() {
        // A: ACGTTACGT, B: ACGTACGA with one extra T in A and a final mismatch
        let script = EditScript::from_entries(vec![5]);
        let summary = summarize(b"ACGTTACGT", b"ACGTACGA", 0, &script);
        assert_eq!(summary.a_only, 1);
        assert_eq!(summary.b_only, 0);
        assert_eq!(summary.mismatches, 1);
        assert_eq!(summary.matches, 7);
        assert_eq!(summary.diffs(), 2);
        assert_eq!(summary.columns(), 9);
    }

    #[test]
    fn test_summarize_offset_start() {
        let summary = summarize(b"TTACGT", b"ACGTCC", 2, &EditScript::new());
        assert_eq!(summary.matches, 4);
        assert_eq!(summary.diffs(), 0);

        let summary = summarize(b"ACGTCC", b"TTACGT", -2, &EditScript::new());
        assert_eq!(summary.matches, 4);
    }

    #[test]
    fn test_summarize_gap_in_a() {
        let script = EditScript::from_entries(vec![-3]);
        let summary = summarize(b"ACGT", b"ACTGT", 0, &script);
        assert_eq!(summary.b_only, 1);
        assert_eq!(summary.matches, 4);
        assert_eq!(summary.mismatches, 0);
    }

    #[test]
    fn test_header_layouts() {
        let dovetail = overlap(4, 3, None);
        let text = OverlapReport::new(b"", b"", &dovetail).to_string();
        assert_eq!(
            text,
            "  A -----+------> 3          dif/len = 0/8 =  0.00%\n  B    4 -------+---->\n\n"
        );

        let mut contained = overlap(4, -3, None);
        contained.reverse_complement = true;
        let text = OverlapReport::new(b"", b"", &contained).to_string();
        assert!(text.starts_with("  A -----+------+---->    dif/len"));
        assert!(text.contains("  B    4 <------- 3   \n"));
    }

    #[test]
    fn test_render_dovetail_alignment() {
        let a = b"GGACGTACGT";
        let b = b"ACGTACGTCC";
        let ovl = overlap(2, 2, Some(vec![]));
        let text = OverlapReport::new(a, b, &ovl).to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[rows.len() - 2], "\tGGACGTACGT  ");
        assert_eq!(rows[rows.len() - 1], "\t  ACGTACGTCC");
    }

    #[test]
    fn test_render_gap_columns() {
        let ovl = overlap(0, 0, Some(vec![5]));
        let text = OverlapReport::new(b"ACGTTACGT", b"ACGTACGT", &ovl).to_string();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[rows.len() - 2], "\tACGTTACGT");
        assert_eq!(rows[rows.len() - 1], "\tACGT-ACGT");
    }

    #[test]
    fn test_render_wraps_and_clips() {
        let a: Vec<u8> = std::iter::repeat(b'A').take(130).collect();
        let ovl = overlap(60, -10, Some(vec![]));
        let b: Vec<u8> = std::iter::repeat(b'A').take(60).collect();
        let text = OverlapReport::new(&a, &b, &ovl).to_string();
        let rows: Vec<&str> = text.lines().filter(|r| r.starts_with('\t')).collect();
        // 25 prefix + 60 aligned + 10 suffix = 95 columns in two rows
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].len(), 1 + PRINT_WIDTH);
        assert_eq!(rows[2].len(), 1 + 45);
    }
}
