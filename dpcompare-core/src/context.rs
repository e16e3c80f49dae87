//! Caller-owned alignment session
//!
//! Every table and scratch buffer the aligners need lives here. A context is
//! cheap to create, grows on demand and never shrinks, so a worker keeps one
//! for its lifetime and passes it to every comparison. Contexts are `Send`
//! but not shared: use one per thread.

use crate::prob::{BinomialModel, ThresholdTable};

#[derive(Debug, Clone, Default)]
pub struct AlignContext {
    pub(crate) model: BinomialModel,
    pub(crate) thresholds: ThresholdTable,
    /// Horizontal deltas of the boundary scan, indexed by column.
    pub(crate) horz: Vec<i64>,
    /// Concatenated O(ND) waves.
    pub(crate) wave: Vec<i64>,
    /// Affine cost and insert matrices, `(blen + 1) * band` each.
    pub(crate) affine_cost: Vec<i64>,
    pub(crate) affine_ins: Vec<i64>,
    /// One row of the tail scorer's matrix.
    pub(crate) tail_row: Vec<f32>,
    /// Reverse complement of B for opposite-orientation comparisons.
    pub(crate) complement: Vec<u8>,
}

impl AlignContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the probability tables and scan scratch cover sequences up to
    /// `max_len` for the given error model.
    ///
    /// `compare` does this on every call; component entry points such as
    /// [`boundary`](Self::boundary) rely on it having been done.
    pub fn prepare(&mut self, max_len: usize, erate: f64, thresh: f64) {
        self.thresholds.ensure(&mut self.model, max_len, erate, thresh);
        let needed = self.thresholds.limit() + 1;
        if self.horz.len() < needed {
            self.horz.resize(needed, 0);
        }
    }

    /// The current difference threshold table.
    pub fn thresholds(&self) -> &ThresholdTable {
        &self.thresholds
    }

    /// The binomial model backing the threshold table.
    pub fn model_mut(&mut self) -> &mut BinomialModel {
        &mut self.model
    }

    /// Longest sequence the prepared tables cover, or `None` before the
    /// first [`prepare`](Self::prepare).
    pub fn prepared_len(&self) -> Option<usize> {
        self.thresholds.params().map(|_| self.thresholds.limit())
    }
}
