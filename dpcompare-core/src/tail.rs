//! Branch-point tail scoring
//!
//! Measures how quickly an alignment decays after a chosen matrix point.
//! Matches add [`BP_RATIO`], every other step costs `1 - BP_RATIO`, and only
//! paths whose score stays positive are followed. The longest such path
//! normalizes the score at the starting point.

use crate::context::AlignContext;
use crate::seq::Bases;

/// Reward for a match; mismatches and gaps cost `1 - BP_RATIO`.
pub const BP_RATIO: f64 = 0.25;

impl AlignContext {
    /// Score `bpmax / longest`, where `longest` is the length of the longest
    /// path from `(imax, jmax)` that stays positive until it reaches the
    /// matrix border or drops to zero.
    ///
    /// A path that dies immediately gives a length of zero and an infinite
    /// score.
    pub fn tail_score(&mut self, a: &[u8], b: &[u8], imax: i64, jmax: i64, bpmax: f64) -> f64 {
        let a = Bases::new(a);
        let b = Bases::new(b);
        let (alen, blen) = (a.len(), b.len());

        let bprat = BP_RATIO;
        let bprem = 1.0 - BP_RATIO;

        // Cells outside the live interval [lft, rgt] are never positive
        let dc = &mut self.tail_row;
        dc.clear();
        dc.resize(alen as usize + 1, 0.0);

        let mut longest;
        let mut lft = imax;
        let mut rgt;
        dc[imax as usize] = bpmax as f32;
        {
            let mut i = imax + 1;
            loop {
                if i > alen {
                    longest = alen - imax;
                    rgt = alen;
                    break;
                }
                dc[i as usize] = (dc[(i - 1) as usize] as f64 - bprem) as f32;
                if dc[i as usize] <= 0.0 {
                    longest = i - imax;
                    rgt = i - 1;
                    break;
                }
                i += 1;
            }
        }

        let extend = |longest: &mut i64, i: i64, j: i64| {
            let len = (i - imax).max(j - jmax);
            if *longest < len {
                *longest = len;
            }
        };

        let mut j = jmax + 1;
        while j <= blen {
            let mut posval = false;

            let mut e = dc[lft as usize] as f64;
            let mut c = e - bprem;
            dc[lft as usize] = c as f32;
            if c <= 0.0 {
                extend(&mut longest, lft, j);
            }

            let mut i = lft + 1;
            while i <= alen {
                if c > 0.0 {
                    posval = true;
                    c -= bprem;
                }
                if e > 0.0 {
                    posval = true;
                    if a[i] == b[j] {
                        e += bprat;
                    } else {
                        e -= bprem;
                    }
                }
                if c < e {
                    c = e;
                }
                e = dc[i as usize] as f64;
                if e > 0.0 {
                    posval = true;
                    if e - bprem > c {
                        c = e - bprem;
                    }
                }
                dc[i as usize] = c as f32;
                if c <= 0.0 {
                    if posval {
                        extend(&mut longest, i, j);
                    }
                    if i > rgt {
                        break;
                    }
                }
                i += 1;
            }
            rgt = i - 1;

            if i > alen {
                extend(&mut longest, alen, j);
            }

            while lft <= rgt && dc[lft as usize] <= 0.0 {
                lft += 1;
            }
            if lft > rgt {
                break;
            }
            while dc[rgt as usize] <= 0.0 {
                rgt -= 1;
            }
            j += 1;
        }

        if j > jmax {
            for i in lft..=rgt {
                if dc[i as usize] > 0.0 {
                    extend(&mut longest, i, blen);
                }
            }
        }

        log::trace!("tail score from ({}, {}): longest path {}", imax, jmax, longest);
        bpmax / longest as f64
    }
}
