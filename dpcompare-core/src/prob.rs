//! Binomial error model
//!
//! An overlap of length `n` is only worth keeping if seeing `d` or more
//! differences at the assumed per-base error rate would be improbable. This
//! module evaluates that tail probability and maintains the table of
//! per-length difference thresholds the boundary scanner prunes with.

/// Bits in the scanner's bit-vector word; the threshold table is sized in
/// whole words.
pub(crate) const WORD_BITS: usize = 64;

/// Binomial tail evaluator with a running log-factorial table.
///
/// Consecutive calls that share the error rate and move `(n, d)` forward by a
/// small amount reuse the previous partial sum instead of recomputing it.
#[derive(Debug, Clone)]
pub struct BinomialModel {
    /// `log_fact[i] = ln(i!)`
    log_fact: Vec<f64>,
    last_e: f64,
    log_e: f64,
    log_c: f64,
    last_n: i64,
    last_d: i64,
    last_sum: f64,
}

impl Default for BinomialModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BinomialModel {
    pub fn new() -> Self {
        Self {
            log_fact: vec![0.0],
            last_e: -1.0,
            log_e: 0.0,
            log_c: 0.0,
            last_n: -1,
            last_d: -1,
            last_sum: 0.0,
        }
    }

    /// Make sure `ln(k!)` is available for every `k <= n`.
    pub fn reserve(&mut self, n: usize) {
        if n < self.log_fact.len() {
            return;
        }
        let max = (n as f64 * 1.2) as usize + 2048;
        self.log_fact.reserve(max + 1 - self.log_fact.len());
        for k in self.log_fact.len()..=max {
            let prev = self.log_fact[k - 1];
            self.log_fact.push((k as f64).ln() + prev);
        }
        log::trace!("log-factorial table extended to {}", max);
    }

    /// `ln C(n, k)` for `0 <= k <= n`
    #[inline]
    fn log_comb(&self, n: i64, k: i64) -> f64 {
        let (n, k) = (n as usize, k as usize);
        (self.log_fact[n] - self.log_fact[n - k]) - self.log_fact[k]
    }

    /// Probability of exactly `k` errors in `n` trials at the cached rate.
    #[inline]
    fn term(&self, n: i64, k: i64) -> f64 {
        if k > n {
            return 0.0;
        }
        (self.log_comb(n, k) + (n - k) as f64 * self.log_c + k as f64 * self.log_e).exp()
    }

    /// Probability that there are `d` or more errors in `n` trials at error
    /// rate `e`.
    pub fn evaluate(&mut self, n: i64, d: i64, e: f64) -> f64 {
        if d == 0 {
            return 1.0;
        }
        if e < 1.0e-50 {
            return 0.0;
        }
        self.reserve(n.max(0) as usize);

        if e != self.last_e {
            self.log_e = e.ln();
            self.log_c = (1.0 - e).ln();
            self.last_e = e;
            self.last_n = n + 1; // forces a full recomputation below
        }

        let (nlast, dlast) = (self.last_n, self.last_d);
        let mut sum;
        if n < nlast || d < dlast || d < (n - nlast) + (d - dlast) {
            sum = 0.0;
            for k in 0..d {
                sum += self.term(n, k);
            }
        } else {
            // P(X_{k+1} < D) = P(X_k < D) - P(X_k = D-1) * e
            sum = self.last_sum;
            for k in nlast..n {
                if dlast - 1 <= k {
                    sum -= (self.log_comb(k, dlast - 1)
                        + ((k + 1) - dlast) as f64 * self.log_c
                        + dlast as f64 * self.log_e)
                        .exp();
                }
            }
            for k in dlast..d {
                sum += self.term(n, k);
            }
        }
        if sum > 1.0 {
            sum = 1.0;
        }

        self.last_sum = sum;
        self.last_n = n;
        self.last_d = d;
        1.0 - sum
    }

    /// Same value as [`evaluate`](Self::evaluate) computed without the
    /// incremental shortcut. Leaves the incremental state untouched.
    pub fn evaluate_from_scratch(&mut self, n: i64, d: i64, e: f64) -> f64 {
        if d == 0 {
            return 1.0;
        }
        if e < 1.0e-50 {
            return 0.0;
        }
        self.reserve(n.max(0) as usize);
        let log_e = e.ln();
        let log_c = (1.0 - e).ln();
        let mut sum = 0.0;
        for k in 0..d.min(n + 1) {
            sum += (self.log_comb(n, k) + (n - k) as f64 * log_c + k as f64 * log_e).exp();
        }
        1.0 - sum.min(1.0)
    }
}

/// Per-length difference thresholds: `threshold(n)` is the smallest `d` such
/// that seeing `d` or more errors in `n` bases has probability below `thresh`
/// (capped at `n + 1`).
#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    dist: Vec<i64>,
    limit: usize,
    params: Option<(f64, f64)>,
}

impl ThresholdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Largest length currently covered.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Error rate and probability cutoff the table was built for.
    pub fn params(&self) -> Option<(f64, f64)> {
        self.params
    }

    /// Threshold for an alignment of length `n`.
    ///
    /// # Panics
    /// If `n` is beyond [`limit`](Self::limit).
    #[inline]
    pub fn threshold(&self, n: i64) -> i64 {
        self.dist[n as usize]
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.dist
    }

    /// Ensure the table covers lengths up to `max` for `(erate, thresh)`.
    ///
    /// Growing with unchanged parameters only computes the new suffix, seeded
    /// with the previous last entry. Changing either parameter rebuilds the
    /// whole table.
    pub fn ensure(&mut self, model: &mut BinomialModel, max: usize, erate: f64, thresh: f64) {
        let same_params = self.params == Some((erate, thresh));

        if max > self.limit || self.dist.is_empty() {
            let grown = (1.2 * max as f64) as usize;
            let grown = ((grown + 2048) / WORD_BITS + 1) * WORD_BITS;
            model.reserve(2 * grown);
            self.dist.resize(grown + 1, 0);

            if same_params {
                let mut d = self.dist[self.limit];
                for n in (self.limit + 1)..=grown {
                    d = Self::advance(model, n as i64, d, erate, thresh);
                    self.dist[n] = d;
                }
                log::debug!(
                    "threshold table extended {} -> {} (erate={}, thresh={:e})",
                    self.limit,
                    grown,
                    erate,
                    thresh
                );
            }
            self.limit = grown;
        }

        if !same_params {
            self.params = Some((erate, thresh));
            let mut d = 1;
            self.dist[0] = d;
            for n in 1..=self.limit {
                d = Self::advance(model, n as i64, d, erate, thresh);
                self.dist[n] = d;
            }
            log::debug!(
                "threshold table rebuilt to {} (erate={}, thresh={:e})",
                self.limit,
                erate,
                thresh
            );
        }
    }

    #[inline]
    fn advance(model: &mut BinomialModel, n: i64, mut d: i64, erate: f64, thresh: f64) -> i64 {
        while d <= n && model.evaluate(n, d, erate) >= thresh {
            d += 1;
        }
        d
    }
}

/// Build a fresh threshold table covering lengths up to `max_n`.
pub fn build_threshold_table(max_n: usize, erate: f64, thresh: f64) -> ThresholdTable {
    let mut model = BinomialModel::new();
    let mut table = ThresholdTable::new();
    table.ensure(&mut model, max_n, erate, thresh);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn close(x: f64, y: f64) -> bool {
        (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(1.0)
    }

    #[test]
    fn test_degenerate_inputs() {
        let mut model = BinomialModel::new();
        assert_eq!(model.evaluate(100, 0, 0.3), 1.0);
        assert_eq!(model.evaluate(100, 5, 0.0), 0.0);
        assert_eq!(model.evaluate(100, 5, 1e-60), 0.0);
    }

    #[test]
    fn test_small_exact_values() {
        let mut model = BinomialModel::new();
        // P(X >= 1) for n = 1 is e
        assert!(close(model.evaluate(1, 1, 0.1), 0.1));
        // P(X >= 2) for n = 2 is e^2
        assert!(close(model.evaluate(2, 2, 0.1), 0.01));
        // P(X >= 1) for n = 3 is 1 - 0.9^3
        assert!(close(model.evaluate(3, 1, 0.1), 1.0 - 0.729));
        // More errors than trials is impossible
        assert!(close(model.evaluate(3, 5, 0.1), 0.0));
    }

    #[test]
    fn test_incremental_walk_matches_scratch() {
        let mut model = BinomialModel::new();
        let mut reference = BinomialModel::new();
        let e = 0.06;
        let mut d = 1;
        for n in 1..=10_000i64 {
            if n % 37 == 0 {
                d += 1;
            }
            let inc = model.evaluate(n, d, e);
            let scratch = reference.evaluate_from_scratch(n, d, e);
            assert!(close(inc, scratch), "n={} d={} {} vs {}", n, d, inc, scratch);
        }
    }

    #[test]
    fn test_threshold_table_small_values() {
        let table = build_threshold_table(20, 0.1, 1e-6);
        assert_eq!(table.threshold(0), 1);
        // Very short alignments can never reach the cutoff
        for n in 1..=5 {
            assert_eq!(table.threshold(n), n + 1);
        }
        assert_eq!(table.threshold(7), 7);
        assert_eq!(table.threshold(12), 9);
    }

    #[test]
    fn test_threshold_table_rebuilds_on_new_params() {
        let mut model = BinomialModel::new();
        let mut table = ThresholdTable::new();
        table.ensure(&mut model, 100, 0.1, 1e-6);
        let loose = table.threshold(100);
        table.ensure(&mut model, 100, 0.01, 1e-6);
        assert_eq!(table.params(), Some((0.01, 1e-6)));
        assert!(table.threshold(100) < loose);
        assert_eq!(table.as_slice(), build_threshold_table(100, 0.01, 1e-6).as_slice());
    }

    #[test]
    fn test_threshold_table_sizing() {
        let table = build_threshold_table(1000, 0.06, 1e-6);
        assert!(table.limit() >= 1000);
        assert_eq!(table.limit() % WORD_BITS, 0);
        assert_eq!(table.as_slice().len(), table.limit() + 1);
    }

    #[test]
    fn test_split_build_matches_single_pass() {
        let whole = build_threshold_table(5000, 0.06, 1e-6);

        let mut model = BinomialModel::new();
        let mut split = ThresholdTable::new();
        split.ensure(&mut model, 10, 0.06, 1e-6);
        split.ensure(&mut model, 3000, 0.06, 1e-6);
        split.ensure(&mut model, 5000, 0.06, 1e-6);

        let upto = whole.limit().min(split.limit());
        assert!(upto >= 5000);
        assert_eq!(&whole.as_slice()[..=upto], &split.as_slice()[..=upto]);
    }

    proptest! {
        #[test]
        fn prop_incremental_matches_scratch(
            steps in proptest::collection::vec((0i64..40, 0i64..4), 1..60),
            start in 1i64..2000,
            e in 0.005f64..0.3,
        ) {
            let mut model = BinomialModel::new();
            let mut reference = BinomialModel::new();
            let mut n = start;
            let mut d = 1;
            for (dn, dd) in steps {
                n += dn;
                d += dd;
                let inc = model.evaluate(n, d, e);
                let scratch = reference.evaluate_from_scratch(n, d, e);
                prop_assert!(close(inc, scratch), "n={} d={} {} vs {}", n, d, inc, scratch);
            }
        }

        #[test]
        fn prop_threshold_table_non_decreasing(
            e in 0.001f64..0.3,
            exp in 2i32..12,
            max in 1usize..3000,
        ) {
            let thresh = 10f64.powi(-exp);
            let table = build_threshold_table(max, e, thresh);
            let entries = table.as_slice();
            for n in 1..entries.len() {
                prop_assert!(entries[n] >= entries[n - 1]);
                prop_assert!(entries[n] <= n as i64 + 1);
            }
        }

        #[test]
        fn prop_split_build_identical(
            e in 0.01f64..0.2,
            mid in 1usize..4000,
            extra in 1usize..4000,
        ) {
            let max = mid + extra;
            let whole = build_threshold_table(max, e, 1e-6);
            let mut model = BinomialModel::new();
            let mut split = ThresholdTable::new();
            split.ensure(&mut model, mid, e, 1e-6);
            split.ensure(&mut model, max, e, 1e-6);
            prop_assert_eq!(&whole.as_slice()[..=max], &split.as_slice()[..=max]);
        }
    }
}
