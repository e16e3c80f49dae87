//! Overlap driver
//!
//! Finds the best overlap between A and B whose start diagonal lies in the
//! requested interval, then aligns it as the mode asks.

use crate::context::AlignContext;
use crate::greedy::strip_terminal_gaps;
use crate::seq::reverse_complement_into;
use crate::types::{CompareError, CompareMode, CompareParams, CompareResult, Overlap};

impl AlignContext {
    /// Compare A with B (or B's reverse complement when `params.opposite`).
    ///
    /// Returns `Ok(None)` when no overlap satisfies the thresholds. The
    /// caller's B is never modified.
    pub fn compare(
        &mut self,
        a: &[u8],
        b: &[u8],
        params: &CompareParams,
    ) -> CompareResult<Option<Overlap>> {
        if params.mode == CompareMode::QualityAlign {
            return Err(CompareError::UnsupportedMode(params.mode));
        }
        if !(params.erate >= 0.0 && params.erate < 1.0) {
            return Err(CompareError::InvalidErrorRate(params.erate));
        }
        let ld_ratio = params.erate / (1.0 - params.erate);

        let alen = a.len() as i64;
        let blen = b.len() as i64;
        let end = params.end.min(alen);
        let beg = params.beg.max(-blen);

        self.prepare(a.len().max(b.len()), params.erate, params.thresh);

        let mut complement = std::mem::take(&mut self.complement);
        let b = if params.opposite {
            reverse_complement_into(b, &mut complement);
            complement.as_slice()
        } else {
            b
        };

        let result = self.compare_oriented(a, b, beg, end, ld_ratio, params);
        self.complement = complement;
        Ok(result)
    }

    fn compare_oriented(
        &mut self,
        a: &[u8],
        b: &[u8],
        beg: i64,
        end: i64,
        ld_ratio: f64,
        params: &CompareParams,
    ) -> Option<Overlap> {
        let alen = a.len() as i64;
        let blen = b.len() as i64;

        // Overlap ends reachable from A's start and from B's start
        let (pos1, dif1) = if end > 0 || (beg == 0 && end == 0) {
            let hit = self.boundary(a, b, beg.max(0), end, params.minlen, ld_ratio);
            (hit.position, hit.diffs)
        } else {
            (blen, 0)
        };

        let (pos2, dif2) = if beg < 0 {
            let mid = if end > 0 { -1 } else { end };
            let hit = self.boundary(b, a, -mid, -beg, params.minlen, ld_ratio);
            (-hit.position, hit.diffs)
        } else {
            (-alen, 0)
        };

        log::debug!(
            "compare {}x{} [{}, {}]: A-side ({}, {}), B-side ({}, {})",
            alen,
            blen,
            beg,
            end,
            pos1,
            dif1,
            pos2,
            dif2
        );

        let use_second = if pos1 >= blen {
            if pos2 <= -alen {
                log::debug!("compare: no overlap");
                return None;
            }
            true
        } else if pos2 <= -alen {
            false
        } else {
            let olen1 = if pos1 < 0 { blen } else { blen - pos1 };
            let olen2 = if pos2 > 0 { alen } else { alen + pos2 };
            if olen1 < olen2 {
                dif1 as f64 + ld_ratio * (olen2 - olen1) as f64 >= dif2 as f64
            } else {
                (dif2 as f64 + ld_ratio * (olen1 - olen2) as f64) < dif1 as f64
            }
        };
        let (finish, diffs) = if use_second { (pos2, dif2) } else { (pos1, dif1) };

        let (begin_offset, end_offset, trace) = match params.mode {
            CompareMode::Align | CompareMode::AlignNoTrace => {
                let aligned = self.greedy_align(a, b, finish, diffs);
                let mut trace = aligned.trace;
                let (begin, end) = strip_terminal_gaps(&mut trace, alen, blen, aligned.start, finish);
                let trace = (params.mode == CompareMode::Align).then_some(trace);
                (begin, end, trace)
            }
            CompareMode::AffineAlign => {
                let aligned = self.affine_align(a, b, finish, diffs);
                (aligned.begin, aligned.end, Some(aligned.trace))
            }
            CompareMode::Overlap | CompareMode::QualityAlign => (alen - (blen - finish), finish, None),
        };

        let length = (alen + blen - (begin_offset.abs() + end_offset.abs())) / 2;
        log::debug!(
            "compare: {} overlap ({}, {}) diffs {} length {}",
            params.mode,
            begin_offset,
            end_offset,
            diffs,
            length
        );

        Some(Overlap {
            begin_offset,
            end_offset,
            diffs,
            length,
            reverse_complement: params.opposite,
            trace,
        })
    }
}
