//! Banded affine-gap alignment
//!
//! Refines an overlap whose end is known by aligning within a band of
//! diagonals around the finish diagonal. Substitutions cost [`SUBCOST`]; a
//! gap of length `n` costs [`GAPCOST`]` + n`. The cheapest start on the top
//! row or left column is traced forward, and the resulting script is then
//! reparsed with unit scores so weak stretches at either end are turned into
//! explicit gaps.

use crate::context::AlignContext;
use crate::seq::Bases;
use crate::trace::EditScript;

pub const SUBCOST: i64 = 2;
pub const GAPCOST: i64 = 1;

/// Result of a banded affine alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffineAlignment {
    /// Start diagonal: positive offsets into A, negative into B.
    pub begin: i64,
    /// Finish offset recomputed from where the traceback stopped.
    pub end: i64,
    /// Affine cost of the cheapest path found.
    pub cost: i64,
    /// Script after reparsing.
    pub trace: EditScript,
    /// Script exactly as traced through the cost matrices.
    pub(crate) raw_trace: EditScript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Match,
    Insert,
    Delete,
}

/// Flat banded matrix addressing: row `j` of B, diagonal offset `k`.
#[derive(Debug, Clone, Copy)]
struct Band {
    diff: i64,
    width: i64,
}

impl Band {
    #[inline]
    fn at(&self, row: i64, k: i64) -> usize {
        (row * self.width + self.diff + k) as usize
    }
}

impl AlignContext {
    /// Affine-gap alignment of A and B in a band of `diff` diagonals either
    /// side of the diagonal through finish point `finish` (same convention as
    /// [`greedy_align`](AlignContext::greedy_align)).
    pub fn affine_align(&mut self, a: &[u8], b: &[u8], finish: i64, diff: i64) -> AffineAlignment {
        let a = Bases::new(a);
        let b = Bases::new(b);
        let (alen, blen) = (a.len(), b.len());
        let diff = diff.max(0);

        let band = Band {
            diff,
            width: 2 * diff + 1,
        };
        let diag = (alen - blen) + finish;
        let infinity = blen * (GAPCOST + SUBCOST + 1) + 2;

        let cells = ((blen + 1) * band.width) as usize;
        let cost = &mut self.affine_cost;
        let ins = &mut self.affine_ins;
        if cost.len() < cells {
            let grown = cells + cells / 5;
            cost.resize(grown, infinity);
            ins.resize(grown, infinity);
        }
        cost[..cells].fill(infinity);
        ins[..cells].fill(infinity);

        // Finish row
        let mut jcrd = if finish <= 0 { blen } else { blen - finish };
        {
            let i = diag + jcrd;
            for k in -diff..=diff {
                let m = i + k;
                cost[band.at(jcrd, k)] = if m < 0 || m > alen {
                    infinity
                } else if finish <= 0 || m == alen {
                    0
                } else {
                    (alen - m) + GAPCOST
                };
            }
        }

        let mut best = infinity;
        let mut bdag = 0i64;
        let mut filled_to_top = true;
        while jcrd > 0 {
            jcrd -= 1;
            let i = diag + jcrd;
            if i + diff < 0 {
                filled_to_top = false;
                break;
            }

            let mut deljk = 0i64;
            for k in (-diff..=diff).rev() {
                let m = i + k;
                ins[band.at(jcrd, k)] = if k == -diff {
                    infinity
                } else {
                    (cost[band.at(jcrd + 1, k - 1)] + GAPCOST).min(ins[band.at(jcrd + 1, k - 1)]) + 1
                };

                deljk = if k == diff {
                    infinity
                } else {
                    (cost[band.at(jcrd, k + 1)] + GAPCOST).min(deljk) + 1
                };

                let c = if m < 0 || m > alen {
                    infinity
                } else if m == alen {
                    0
                } else {
                    let sub = if b[jcrd + 1] != a[m + 1] { SUBCOST } else { 0 };
                    (cost[band.at(jcrd + 1, k)] + sub)
                        .min(ins[band.at(jcrd, k)])
                        .min(deljk)
                };
                cost[band.at(jcrd, k)] = c;

                if m == 0 && c < best {
                    best = c;
                    bdag = m - jcrd;
                }
            }
        }

        if filled_to_top {
            for k in (-diff..=diff).rev() {
                let m = diag + k;
                if m >= 0 && m <= alen && cost[band.at(0, k)] < best {
                    best = cost[band.at(0, k)];
                    bdag = m;
                }
            }
        }

        if best >= infinity {
            log::debug!("affine: no path within band {} of diagonal {}", diff, diag);
            return AffineAlignment {
                begin: diag,
                end: finish,
                cost: best,
                trace: EditScript::new(),
                raw_trace: EditScript::new(),
            };
        }
        log::trace!("affine: best {} on diagonal {}", best, bdag);

        // Replay the cheapest path forward
        let mut raw = EditScript::new();
        let mut jcrd = if bdag >= 0 { 0 } else { -bdag };
        let mut i = bdag + jcrd;
        let mut k = bdag - diag;
        let mut state = State::Match;
        let mut deljk = 0i64;
        while jcrd != blen && i != alen {
            match state {
                State::Match => {
                    let x = if b[jcrd + 1] != a[i + 1] { SUBCOST } else { 0 };
                    let here = cost[band.at(jcrd, k)];
                    if here == cost[band.at(jcrd + 1, k)] + x {
                        i += 1;
                        jcrd += 1;
                    } else if here == ins[band.at(jcrd, k)] {
                        state = State::Insert;
                    } else {
                        state = State::Delete;
                        deljk = here;
                    }
                }
                State::Insert => {
                    if ins[band.at(jcrd, k)] == cost[band.at(jcrd + 1, k - 1)] + GAPCOST + 1 {
                        state = State::Match;
                    }
                    jcrd += 1;
                    k -= 1;
                    raw.push(-(i + 1));
                }
                State::Delete => {
                    if deljk == cost[band.at(jcrd, k + 1)] + GAPCOST + 1 {
                        state = State::Match;
                    }
                    i += 1;
                    k += 1;
                    deljk -= 1;
                    raw.push(jcrd + 1);
                }
            }
        }

        let end = if i != alen {
            i - alen
        } else if jcrd != blen {
            blen - jcrd
        } else {
            0
        };

        let trace = Reparse::new(a, b, bdag).run(raw.entries());

        AffineAlignment {
            begin: bdag,
            end,
            cost: best,
            trace,
            raw_trace: raw,
        }
    }
}

/// Outcome of stepping over one aligned column during reparsing.
enum Step {
    Continue,
    /// A cut was committed; resume at this raw entry, or in the tail when
    /// `None`.
    Cut(Option<usize>),
}

/// Unit-score walk over a traced alignment.
///
/// Matches score +1 and every other column -1. When the running score climbs
/// past its previous maximum after dipping to a lower minimum, the stretch
/// between that maximum and the minimum is rewritten as a pair of gaps and
/// the walk restarts from the minimum. Ties keep the earliest maximum and the
/// latest minimum.
struct Reparse<'a> {
    a: Bases<'a>,
    b: Bases<'a>,
    out: EditScript,
    i: i64,
    j: i64,
    score: i64,
    max_level: i64,
    min_level: i64,
    max_i: i64,
    max_j: i64,
    min_i: i64,
    min_j: i64,
    /// Raw entry to resume from after a cut at the current minimum.
    min_resume: Option<usize>,
}

impl<'a> Reparse<'a> {
    fn new(a: Bases<'a>, b: Bases<'a>, begin: i64) -> Self {
        let (i, j) = if begin > 0 {
            (begin + 1, 1)
        } else if begin < 0 {
            (1, -begin + 1)
        } else {
            (1, 1)
        };
        Self {
            a,
            b,
            out: EditScript::new(),
            i,
            j,
            score: 0,
            max_level: 0,
            min_level: 0,
            max_i: i - 1,
            max_j: j - 1,
            min_i: 0,
            min_j: 0,
            min_resume: Some(0),
        }
    }

    fn run(mut self, raw: &[i64]) -> EditScript {
        let mut resume = Some(0usize);
        loop {
            let mut cut = None;
            let mut p = resume.unwrap_or(raw.len());
            'entries: while p < raw.len() {
                let c = raw[p];
                p += 1;
                if c < 0 {
                    while self.i != -c {
                        if let Step::Cut(at) = self.aligned(Some(p - 1)) {
                            cut = Some(at);
                            break 'entries;
                        }
                    }
                    self.j += 1;
                } else {
                    while self.j != c {
                        if let Step::Cut(at) = self.aligned(Some(p - 1)) {
                            cut = Some(at);
                            break 'entries;
                        }
                    }
                    self.i += 1;
                }
                self.gap(if p < raw.len() { Some(p) } else { None });
            }
            if let Some(at) = cut {
                resume = at;
                continue;
            }

            resume = None;
            while self.i <= self.a.len() && self.j <= self.b.len() {
                if let Step::Cut(Some(at)) = self.aligned(None) {
                    resume = Some(at);
                    break;
                }
            }
            if resume.is_none() {
                break;
            }
        }
        self.finish()
    }

    /// Score the column `(i, j)` and advance past it.
    fn aligned(&mut self, resume: Option<usize>) -> Step {
        let same = self.a[self.i] == self.b[self.j];
        self.i += 1;
        self.j += 1;
        if same {
            self.score += 1;
            if self.score > self.max_level {
                if self.min_level < self.max_level {
                    self.cut();
                    return Step::Cut(self.min_resume);
                }
                self.max_level = self.score;
                self.min_level = self.score;
                self.max_i = self.i - 1;
                self.max_j = self.j - 1;
            }
        } else {
            self.score -= 1;
            self.note_min(resume);
        }
        Step::Continue
    }

    /// Account for the gap column just consumed.
    fn gap(&mut self, resume: Option<usize>) {
        self.score -= 1;
        self.note_min(resume);
    }

    #[inline]
    fn note_min(&mut self, resume: Option<usize>) {
        if self.score <= self.min_level {
            self.min_level = self.score;
            self.min_i = self.i - 1;
            self.min_j = self.j - 1;
            self.min_resume = resume;
        }
    }

    /// Replace the span from the last maximum to the last minimum with gaps
    /// and restart from the minimum.
    fn cut(&mut self) {
        if self.min_i - self.max_i != 1 || self.min_j - self.max_j != 1 {
            for _ in (self.max_i + 1)..=self.min_i {
                self.out.push(self.max_j + 1);
            }
            for _ in (self.max_j + 1)..=self.min_j {
                self.out.push(-(self.min_i + 1));
            }
        }
        self.score = 0;
        self.max_level = 0;
        self.min_level = 0;
        self.max_i = self.min_i;
        self.max_j = self.min_j;
        self.i = self.min_i + 1;
        self.j = self.min_j + 1;
    }

    fn finish(mut self) -> EditScript {
        if self.score <= self.max_level && (self.i - self.max_i != 2 || self.j - self.max_j != 2) {
            for _ in (self.max_i + 1)..self.i {
                self.out.push(self.max_j + 1);
            }
            for _ in (self.max_j + 1)..self.j {
                self.out.push(-self.i);
            }
        }
        self.out
    }
}
