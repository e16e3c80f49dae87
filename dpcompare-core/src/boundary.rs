//! Thresholded bit-vector boundary scan
//!
//! Sweeps the edit-distance matrix of A (columns) against B (rows) 64 rows
//! at a time with Myers' bit-parallel recurrence, starting from zero-cost
//! entry points on the top row in a window of columns. Only the band of
//! columns whose running difference count stays under the per-length
//! threshold is kept. When the band reaches A's end the cells on the right
//! edge are candidate overlap ends; once all of B has been consumed the
//! bottom row is checked as well.

use crate::context::AlignContext;
use crate::prob::WORD_BITS;
use crate::seq::Bases;

const WORD: i64 = WORD_BITS as i64;

/// Best overlap end found by a boundary scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryHit {
    /// Offset of the overlap end from B's far end. Positive: B has this many
    /// bases past the overlap. Zero or negative: A has `-position` bases past
    /// it. Equal to B's length when nothing qualified.
    pub position: i64,
    /// Differences in the overlap.
    pub diffs: i64,
}

impl BoundaryHit {
    /// False for the "no boundary contact" result of a scan against a B of
    /// length `blen`.
    pub fn touches_boundary(&self, blen: i64) -> bool {
        self.position < blen
    }
}

/// Row and difference count of a right-edge cell.
#[derive(Debug, Clone, Copy)]
struct EdgeCell {
    row: i64,
    diffs: i64,
}

impl EdgeCell {
    /// Whether `(row, diffs)` is at least as good as this cell once the
    /// length difference is charged at `ld_ratio` differences per base.
    #[inline]
    fn admits(&self, row: i64, diffs: i64, ld_ratio: f64) -> bool {
        (row - self.row) as f64 * ld_ratio + self.diffs as f64 >= diffs as f64
    }

    /// Whether `(row, diffs)` is this cell padded with trailing gaps.
    #[inline]
    fn pads_to(&self, row: i64, diffs: i64) -> bool {
        row - self.row == diffs - self.diffs
    }
}

impl AlignContext {
    /// Scan A against B for the best overlap end reachable from a zero-cost
    /// start in columns `[beg, end]` of A.
    ///
    /// Overlaps shorter than `minlen` rows of B are only used to pad a
    /// longer candidate that would otherwise end in external gaps.
    /// `ld_ratio` must be `erate / (1 - erate)` for the error rate the
    /// context was prepared with.
    ///
    /// The context must have been prepared with the `erate` and `thresh`
    /// intended for this scan. Only the covered length is checked; a context
    /// prepared for other parameters scans with its own thresholds.
    ///
    /// # Panics
    /// If [`prepare`](AlignContext::prepare) has not been called for
    /// sequences at least as long as A and B.
    pub fn boundary(
        &mut self,
        a: &[u8],
        b: &[u8],
        beg: i64,
        end: i64,
        minlen: i64,
        ld_ratio: f64,
    ) -> BoundaryHit {
        let needed = a.len().max(b.len());
        assert!(
            matches!(self.prepared_len(), Some(n) if n >= needed),
            "alignment context not prepared for sequences of length {}",
            needed
        );

        let a = Bases::new(a);
        let b = Bases::new(b);
        let (alen, blen) = (a.len(), b.len());
        let end = end.min(alen);
        let beg = beg.max(0);

        let horz = &mut self.horz;
        let dist = &self.thresholds;

        let (mut lft, mut rgt) = (beg, end);
        let (mut lval, mut rval) = (0i64, 0i64);
        for i in lft..=rgt {
            horz[i as usize] = 0;
        }
        let mut prob_thresh = 1i64;

        let mut best = EdgeCell { row: 0, diffs: 0 };
        let mut too_short = EdgeCell { row: 0, diffs: 0 };
        let mut local_min = EdgeCell {
            row: 0,
            diffs: alen - end,
        };

        let mut peq = [0u64; 256];
        let mut j = 0i64;
        while j < blen {
            let row = (j + WORD).min(blen);

            let mut ebit = 0u64;
            let mut one = 1u64;
            for i in (j + 1)..=row {
                peq[b[i] as usize] |= one;
                ebit = one;
                one <<= 1;
            }

            // Open enough columns past the band for this block
            let dj = dist.threshold(row);
            let r = (rgt + WORD + (dj - prob_thresh)).min(alen);
            for i in (rgt + 1)..=r {
                horz[i as usize] = 1;
                rval += 1;
            }
            rgt = r;
            prob_thresh = dj;

            let mut pv: u64 = !0;
            let mut mv: u64 = 0;
            let bval = rval;
            lval += row - j;
            rval = lval;
            for i in (lft + 1)..=rgt {
                let h = horz[i as usize];
                let pc = (h > 0) as u64;
                let mc = (h < 0) as u64;

                let mut u = peq[a[i] as usize];
                let mut y = u | mc;
                let x = ((y & pv).wrapping_add(pv) ^ pv) | y;
                u |= mv;

                y = pv;
                pv = mv | !(x | y);
                mv = y & x;

                let h = if pv & ebit != 0 {
                    1
                } else if mv & ebit != 0 {
                    -1
                } else {
                    0
                };

                y = (pv << 1) | pc;
                pv = (mv << 1) | mc | !(u | y);
                mv = y & u;

                horz[i as usize] = h;
                rval += h;
            }

            if rgt == alen {
                let mut score = bval;
                for i in (j + 1)..=row {
                    if pv & 1 != 0 {
                        score += 1;
                    } else if mv & 1 != 0 {
                        score -= 1;
                    }
                    pv >>= 1;
                    mv >>= 1;

                    if score >= prob_thresh {
                        continue;
                    }
                    if i < minlen {
                        if too_short.admits(i, score, ld_ratio) {
                            too_short = EdgeCell { row: i, diffs: score };
                        }
                        if !local_min.pads_to(i, score) {
                            if i - local_min.row < score - local_min.diffs {
                                // Earlier minimum was reached through a
                                // band entry that has since been trimmed
                                log::trace!(
                                    "boundary: row {} local minimum {} replaces better ({}, {})",
                                    i,
                                    score,
                                    local_min.row,
                                    local_min.diffs
                                );
                            }
                            local_min = EdgeCell { row: i, diffs: score };
                        }
                    } else if best.admits(i, score, ld_ratio) {
                        // Prefer a short overlap over one that needs external gaps
                        best = if too_short.pads_to(i, score) {
                            log::trace!("boundary: row {} falls back to short overlap", i);
                            too_short
                        } else if local_min.pads_to(i, score) {
                            log::trace!("boundary: row {} falls back to local minimum", i);
                            local_min
                        } else {
                            EdgeCell { row: i, diffs: score }
                        };
                    }
                }
            }

            for i in (j + 1)..=row {
                peq[b[i] as usize] = 0;
            }

            // Trim the band where the edge values reach the threshold
            while rgt >= lft {
                if rval < prob_thresh {
                    break;
                }
                rval -= horz[rgt as usize];
                rgt -= 1;
            }
            if rgt < lft {
                break;
            }
            while lval >= prob_thresh {
                lft += 1;
                lval += horz[lft as usize];
            }

            j += WORD;
        }

        let mut position = blen - best.row;
        let mut diffs = best.diffs;

        if j >= blen && lft <= rgt {
            let mut v = diffs + (position as f64 * ld_ratio) as i64;
            let mut p = rval;
            let floor = lft.max(minlen);
            let mut bottom_hit = false;
            let mut i = rgt;
            while i >= floor {
                // Ties go to the rightmost bottom-row cell
                if p < prob_thresh && (p < v || (p == v && !bottom_hit)) {
                    position = i - alen;
                    diffs = p;
                    v = p;
                    bottom_hit = true;
                }
                p -= horz[i as usize];
                i -= 1;
            }
        }

        log::trace!(
            "boundary [{}, {}] over {}x{} -> ({}, {})",
            beg,
            end,
            alen,
            blen,
            position,
            diffs
        );
        BoundaryHit { position, diffs }
    }
}
