//! O(ND) alignment from a known overlap end
//!
//! Given where an overlap finishes and roughly how many differences it has,
//! recover its start and an edit script by growing difference waves
//! backwards from the finish point until one of them runs off the start of
//! either sequence.

use crate::context::AlignContext;
use crate::seq::Bases;
use crate::trace::EditScript;

/// Start diagonal and edit script of an O(ND) alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreedyAlignment {
    /// Positive: the alignment starts at this offset into A. Negative: at
    /// `-start` into B.
    pub start: i64,
    pub trace: EditScript,
}

impl AlignContext {
    /// Align A and B backwards from `finish`.
    ///
    /// `finish >= 0` means B has `finish` bases past the overlap end;
    /// `finish < 0` means A has `-finish` bases past it. `diff` is the
    /// expected difference count; zero skips the alignment entirely and
    /// reports the finish diagonal as the start.
    pub fn greedy_align(&mut self, a: &[u8], b: &[u8], finish: i64, diff: i64) -> GreedyAlignment {
        let a = Bases::new(a);
        let b = Bases::new(b);
        let (alen, blen) = (a.len(), b.len());

        let diag = (alen - blen) + finish;
        let infinity = blen + 2;
        let exact = GreedyAlignment {
            start: diag,
            trace: EditScript::new(),
        };

        if diff == 0 {
            return exact;
        }

        let mut j = if finish < 0 { blen } else { blen - finish };
        let mut i = diag + j;
        loop {
            if i <= 0 || j <= 0 {
                return exact;
            }
            if a[i] != b[j] {
                break;
            }
            i -= 1;
            j -= 1;
        }

        // Each wave is framed by two infinite cells on either side
        let wave = &mut self.wave;
        wave.clear();
        let levels = (1.2 * diff as f64) as usize + 50;
        wave.reserve((levels + 5) * (levels + 1));
        wave.extend_from_slice(&[infinity, infinity, j, infinity, infinity]);

        let mut n = 0usize;
        let mut level = 0i64;
        let (fcell, wpos, start);
        'levels: loop {
            level += 1;
            wave.push(infinity);
            wave.push(infinity);
            n += 1;
            for k in -level..=level {
                let mut j = (wave[n] - 1).min(wave[n - 1] - 1).min(wave[n + 1]);
                let mut i = (diag + k) + j;
                loop {
                    if i <= 0 || j <= 0 {
                        start = if i <= 0 { -j } else { i };
                        fcell = n;
                        wpos = k;
                        break 'levels;
                    }
                    if a[i] != b[j] {
                        break;
                    }
                    i -= 1;
                    j -= 1;
                }
                wave.push(j);
                n += 1;
            }
            wave.push(infinity);
            wave.push(infinity);
            n += 1;
        }
        log::trace!("greedy: start {} after {} waves (diff {})", start, level, diff);

        let mut trace = EditScript::new();
        let mut n = fcell;
        let mut k = wpos;
        for d in (0..level).rev() {
            let mut m = n;
            let mut j = wave[n] - 1;
            if wave[n - 1] - 1 < j {
                j = wave[n - 1] - 1;
                m = n - 1;
            }
            if wave[n + 1] < j {
                j = wave[n + 1];
                m = n + 1;
            }
            if m < n {
                trace.push(-((diag + k) + (j + 1)));
                k -= 1;
            } else if m > n {
                trace.push(j + 1);
                k += 1;
            }
            if d > 0 {
                n = m - (2 * d as usize + 4);
            }
        }

        GreedyAlignment { start, trace }
    }
}

/// Remove gap entries that lie outside the overlap and fold them into the
/// offsets.
///
/// Gaps before the first base (`1`, `-1`) shift the begin offset; gaps past
/// the last base (`> blen`, `< -alen`) shift the end offset. Returns the
/// adjusted `(begin, end)`.
pub fn strip_terminal_gaps(
    trace: &mut EditScript,
    alen: i64,
    blen: i64,
    begin: i64,
    end: i64,
) -> (i64, i64) {
    let mut begin = begin;
    let mut end = end;
    trace.entries_mut().retain(|&c| {
        if c < -alen {
            end += 1;
        } else if c > blen {
            end -= 1;
        } else if c == -1 {
            begin -= 1;
        } else if c == 1 {
            begin += 1;
        } else {
            return true;
        }
        false
    });
    (begin, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::summarize;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_zero_diff_shortcut() {
        let mut ctx = AlignContext::new();
        let aln = ctx.greedy_align(b"ACGTACGT", b"TTTT", 3, 0);
        assert_eq!(aln.start, (8 - 4) + 3);
        assert!(aln.trace.is_empty());
    }

    #[test]
    fn test_exact_diagonal_skips_waves() {
        let mut ctx = AlignContext::new();
        let aln = ctx.greedy_align(b"GGACGTAC", b"ACGTAC", 0, 4);
        assert_eq!(aln.start, 2);
        assert!(aln.trace.is_empty());
    }

    #[test]
    fn test_single_substitution() {
        let mut ctx = AlignContext::new();
        let aln = ctx.greedy_align(b"ACGTACGTACGT", b"ACGTACGTACGA", 0, 1);
        assert_eq!(aln.start, 0);
        assert!(aln.trace.is_empty());
    }

    #[test]
    fn test_single_deletion_from_b() {
        let a = b"AAAACCCCGGGGTTTT";
        let b = b"AAAACCCGGGGTTTT";
        let mut ctx = AlignContext::new();
        let aln = ctx.greedy_align(a, b, 0, 1);
        assert_eq!(aln.start, 0);
        assert_eq!(aln.trace.entries(), &[5]);
        assert_eq!(summarize(a, b, aln.start, &aln.trace).diffs(), 1);
    }

    #[test]
    fn test_extra_base_in_b() {
        let a = b"AAAACCCGGGGTTTT";
        let b = b"AAAACCCCGGGGTTTT";
        let mut ctx = AlignContext::new();
        let aln = ctx.greedy_align(a, b, 0, 1);
        // One substitution with B's first base hanging off is found before
        // the gap in A
        assert_eq!(aln.start, -1);
        assert!(aln.trace.is_empty());
        let summary = summarize(a, b, aln.start, &aln.trace);
        assert_eq!(summary.mismatches, 1);
        assert_eq!(summary.diffs(), 1);
    }

    #[test]
    fn test_mutated_copy_round_trip() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut ctx = AlignContext::new();
        for _ in 0..20 {
            let a: Vec<u8> = (0..200).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
            let mut b = a.clone();
            let edits = rng.gen_range(1..8);
            for _ in 0..edits {
                let pos = rng.gen_range(20..b.len() - 20);
                match rng.gen_range(0..3) {
                    0 => b[pos] = if b[pos] == b'A' { b'C' } else { b'A' },
                    1 => {
                        b.remove(pos);
                    }
                    _ => b.insert(pos, b'G'),
                }
            }

            let aln = ctx.greedy_align(&a, &b, 0, edits);
            let summary = summarize(&a, &b, aln.start, &aln.trace);
            assert!(summary.diffs() <= edits, "{} > {}", summary.diffs(), edits);
            assert!(aln.trace.len() as i64 <= edits);
        }
    }

    #[test]
    fn test_strip_terminal_gaps() {
        let mut trace = EditScript::from_entries(vec![1, 1, 7, -9, 31]);
        let (begin, end) = strip_terminal_gaps(&mut trace, 30, 30, 0, 0);
        assert_eq!(trace.entries(), &[7, -9]);
        assert_eq!((begin, end), (2, -1));

        let mut trace = EditScript::from_entries(vec![-1, -31, 12]);
        let (begin, end) = strip_terminal_gaps(&mut trace, 30, 40, 5, -3);
        assert_eq!(trace.entries(), &[12]);
        assert_eq!((begin, end), (4, -2));
    }
}
