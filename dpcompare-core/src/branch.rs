//! Branch-point detection
//!
//! Looks for the point where two fragments that agree over a prefix stop
//! agreeing, as happens at the edge of a repeat. A ratio-scored matrix
//! (matches add [`BP_RATIO`], everything else costs `1 - BP_RATIO`) is
//! filled only where a simultaneous unit-cost edit distance stays under the
//! difference thresholds. The highest ratio score seen is the branch point;
//! [`tail_score`](AlignContext::tail_score) then measures how quickly the
//! alignment falls apart after it.

use crate::context::AlignContext;
use crate::seq::Bases;
use crate::tail::BP_RATIO;

/// A detected branch point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchPoint {
    /// Column of A at the branch point.
    pub a_position: i64,
    /// Row of B at the branch point.
    pub b_position: i64,
    /// Peak score divided by the prefix length leading to it.
    pub ascent: f64,
    /// Peak score divided by the length over which it decays to zero.
    pub descent: f64,
}

/// Highest ratio score seen so far. The first cell to reach a value wins.
#[derive(Debug, Default)]
struct Peak {
    score: f64,
    i: i64,
    j: i64,
    diffs: i64,
}

impl Peak {
    #[inline]
    fn offer(&mut self, d: f32, i: i64, j: i64, diffs: i64) {
        if d as f64 > self.score {
            self.score = d as f64;
            self.i = i;
            self.j = j;
            self.diffs = diffs;
        }
    }
}

impl AlignContext {
    /// Find a branch point between A and B for overlaps starting on a
    /// diagonal in `[beg, end]` (positive diagonals start inside A, negative
    /// ones inside B).
    ///
    /// The branch point must have at least `minprefix` aligned columns before
    /// it and leave at least `minsuffix` bases of each sequence after it.
    /// Prepare the context with roughly twice the usual sequencing error rate
    /// so that the prefix survives the thresholds.
    ///
    /// # Panics
    /// If [`prepare`](AlignContext::prepare) has not been called for
    /// sequences at least as long as A and B.
    pub fn branch_point(
        &mut self,
        a: &[u8],
        b: &[u8],
        beg: i64,
        end: i64,
        minprefix: i64,
        minsuffix: i64,
    ) -> Option<BranchPoint> {
        let needed = a.len().max(b.len());
        assert!(
            matches!(self.prepared_len(), Some(n) if n >= needed),
            "alignment context not prepared for sequences of length {}",
            needed
        );

        let (aseq, bseq) = (a, b);
        let a = Bases::new(aseq);
        let b = Bases::new(bseq);
        let (alen, blen) = (a.len(), b.len());
        let end = end.min(alen);
        let beg = beg.max(-blen);
        if beg > end {
            log::debug!("branch point: empty diagonal range [{}, {}]", beg, end);
            return None;
        }

        let bprat = BP_RATIO as f32;
        let bprem = (1.0 - BP_RATIO) as f32;
        let mut peak = Peak::default();

        {
            let dp = &mut self.horz;
            let dc = &mut self.tail_row;
            let dist = &self.thresholds;
            dc.clear();
            dc.resize(alen as usize + 1, 0.0);

            // First row, and how many free entries its start column has
            let (mut jfst, ahg) = if end < 0 { (-end, 0) } else { (0, end) };
            let mut lft;
            let mut rgt;
            if jfst == 0 {
                lft = beg.max(0);
                rgt = end;
                for i in lft..=rgt {
                    dp[i as usize] = 0;
                    dc[i as usize] = 0.0;
                }
                let mut k = 1;
                while rgt + k <= alen && k < dist.threshold(k) {
                    dp[(rgt + k) as usize] = k;
                    dc[(rgt + k) as usize] = -(k as f32) * bprem;
                    k += 1;
                }
                rgt += k - 1;
            } else {
                let mut i = 0;
                while i <= alen && i < dist.threshold(i) {
                    dp[i as usize] = i;
                    dc[i as usize] = -(i as f32) * bprem;
                    i += 1;
                }
                lft = 0;
                rgt = i - 1;
            }

            // Threshold for column x of row j: before the diagonal band the
            // length is measured along B, inside it by the row, after it
            // along A
            let limit = |x: i64, j: i64, bhg: i64| {
                if x < j {
                    dist.threshold(x.max(bhg))
                } else if x <= j + ahg {
                    dist.threshold(j)
                } else {
                    dist.threshold(x - ahg)
                }
            };

            jfst += 1;
            let mut bhg = if beg < 0 { jfst + beg } else { jfst };

            for j in jfst..=blen {
                let mut e = dp[lft as usize];
                let mut f = dc[lft as usize];
                let (mut c, mut d) = if j <= -beg { (0, 0.0) } else { (e + 1, f - bprem) };
                if j > -beg {
                    peak.offer(d, lft, j, c);
                }
                dp[lft as usize] = c;
                dc[lft as usize] = d;

                let mut i = lft + 1;
                while i <= rgt {
                    c += 1;
                    d -= bprem;
                    if a[i] == b[j] {
                        f += bprat;
                    } else {
                        f -= bprem;
                        e += 1;
                    }
                    c = c.min(e);
                    if d < f {
                        d = f;
                    }

                    e = dp[i as usize];
                    if e < c {
                        c = e + 1;
                    }
                    f = dc[i as usize];
                    if f - bprem > d {
                        d = f - bprem;
                    }

                    dp[i as usize] = c;
                    peak.offer(d, i, j, c);
                    dc[i as usize] = d;
                    i += 1;
                }

                // Column rgt + 1 has only left and diagonal neighbours
                if i <= alen {
                    c += 1;
                    d -= bprem;
                    if a[i] == b[j] {
                        f += bprat;
                    } else {
                        f -= bprem;
                        e += 1;
                    }
                    c = c.min(e);
                    if d < f {
                        d = f;
                    }

                    dp[i as usize] = c;
                    peak.offer(d, i, j, c);
                    dc[i as usize] = d;
                    i += 1;
                }

                while i <= alen {
                    c += 1;
                    if c >= limit(i, j, bhg) {
                        break;
                    }
                    dp[i as usize] = c;
                    d -= bprem;
                    peak.offer(d, i, j, c);
                    dc[i as usize] = d;
                    i += 1;
                }
                rgt = i - 1;

                while rgt >= lft && dp[rgt as usize] >= limit(rgt, j, bhg) {
                    rgt -= 1;
                }
                if rgt < lft {
                    break;
                }
                if j > -beg {
                    while dp[lft as usize] >= limit(lft, j, bhg) {
                        lft += 1;
                    }
                }
                bhg += 1;
            }
        }

        let plen = peak.i.min(peak.j) + (0.5 * peak.diffs as f64) as i64;
        let slen = (alen - peak.i).min(blen - peak.j);
        if peak.score <= 0.0 || plen < minprefix || slen < minsuffix {
            log::debug!(
                "branch point: peak {} at ({}, {}) rejected, prefix {} suffix {}",
                peak.score,
                peak.i,
                peak.j,
                plen,
                slen
            );
            return None;
        }

        let descent = self.tail_score(aseq, bseq, peak.i, peak.j, peak.score);
        log::debug!(
            "branch point at ({}, {}): peak {} prefix {} descent {}",
            peak.i,
            peak.j,
            peak.score,
            plen,
            descent
        );
        Some(BranchPoint {
            a_position: peak.i,
            b_position: peak.j,
            ascent: peak.score / plen as f64,
            descent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// A shared 60 bp prefix followed by 40 As in A and 40 Cs in B.
    fn diverging_pair(seed: u64) -> (Vec<u8>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let prefix: Vec<u8> = (0..60).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        let a = [prefix.as_slice(), &[b'A'; 40][..]].concat();
        let b = [prefix.as_slice(), &[b'C'; 40][..]].concat();
        (a, b)
    }

    #[test]
    fn test_reports_column_where_suffixes_diverge() {
        let (a, b) = diverging_pair(5);
        let mut ctx = AlignContext::new();
        ctx.prepare(100, 0.12, 1e-6);
        let bp = ctx.branch_point(&a, &b, 0, 0, 20, 20).unwrap();
        assert_eq!((bp.a_position, bp.b_position), (60, 60));
        // 60 matches at 0.25 each, spread over the 60 bp prefix
        assert_eq!(bp.ascent, 0.25);
        // The peak of 15 decays by 0.75 per step and reaches zero after 20
        assert_eq!(bp.descent, 0.75);
    }

    #[test]
    fn test_prefix_and_suffix_minimums() {
        let (a, b) = diverging_pair(5);
        let mut ctx = AlignContext::new();
        ctx.prepare(100, 0.12, 1e-6);
        assert_eq!(ctx.branch_point(&a, &b, 0, 0, 61, 20), None);
        assert_eq!(ctx.branch_point(&a, &b, 0, 0, 20, 41), None);
        assert!(ctx.branch_point(&a, &b, 0, 0, 60, 40).is_some());
    }

    #[test]
    fn test_identical_sequences_have_no_suffix() {
        let mut rng = StdRng::seed_from_u64(17);
        let a: Vec<u8> = (0..100).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect();
        let mut ctx = AlignContext::new();
        ctx.prepare(100, 0.12, 1e-6);
        assert_eq!(ctx.branch_point(&a, &a, 0, 0, 20, 1), None);
    }

    #[test]
    fn test_empty_diagonal_range() {
        let mut ctx = AlignContext::new();
        ctx.prepare(8, 0.12, 1e-6);
        assert_eq!(ctx.branch_point(b"ACGTACGT", b"ACGTACGT", 3, 1, 0, 0), None);
    }

    #[test]
    #[should_panic(expected = "not prepared")]
    fn test_unprepared_context_panics() {
        let mut ctx = AlignContext::new();
        ctx.branch_point(b"ACGT", b"ACGT", 0, 0, 1, 1);
    }
}
