//! Request and result types shared by the aligners and the overlap driver

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::trace::EditScript;

/// What the driver should produce once an overlap has been located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    /// Offsets only, begin offset synthesized from the end offset.
    Overlap,
    /// Offsets, difference count and an O(ND) edit trace.
    #[default]
    Align,
    /// As `Align` but the trace is discarded.
    AlignNoTrace,
    /// Affine-gap alignment refinement of the located overlap.
    #[serde(alias = "affine")]
    AffineAlign,
    /// Quality-value aware alignment. Not supported.
    QualityAlign,
}

impl std::fmt::Display for CompareMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CompareMode::Overlap => "overlap",
            CompareMode::Align => "align",
            CompareMode::AlignNoTrace => "align-no-trace",
            CompareMode::AffineAlign => "affine-align",
            CompareMode::QualityAlign => "quality-align",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during a comparison
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompareError {
    #[error("Error rate {0} is outside [0, 1)")]
    InvalidErrorRate(f64),

    #[error("Comparison mode '{0}' is not supported")]
    UnsupportedMode(CompareMode),
}

pub type CompareResult<T> = Result<T, CompareError>;

fn default_erate() -> f64 {
    0.06
}

fn default_thresh() -> f64 {
    1e-6
}

fn default_minlen() -> i64 {
    40
}

/// Parameters of a single comparison.
///
/// `beg` and `end` bound the diagonals the overlap may start on: an overlap
/// in which A's first base aligns with B at offset `k` has start diagonal
/// `k`, negative when B starts before A.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareParams {
    #[serde(default)]
    pub beg: i64,
    #[serde(default)]
    pub end: i64,
    /// Compare A against the reverse complement of B
    #[serde(default)]
    pub opposite: bool,
    #[serde(default = "default_erate")]
    pub erate: f64,
    #[serde(default = "default_thresh")]
    pub thresh: f64,
    #[serde(default = "default_minlen")]
    pub minlen: i64,
    #[serde(default)]
    pub mode: CompareMode,
}

impl Default for CompareParams {
    fn default() -> Self {
        Self {
            beg: 0,
            end: 0,
            opposite: false,
            erate: default_erate(),
            thresh: default_thresh(),
            minlen: default_minlen(),
            mode: CompareMode::default(),
        }
    }
}

impl CompareParams {
    /// Parameters searching every start diagonal for sequences of the given
    /// lengths.
    pub fn full_range(alen: usize, blen: usize) -> Self {
        Self {
            beg: -(blen as i64),
            end: alen as i64,
            ..Self::default()
        }
    }
}

/// How two fragments relate once their overlap is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapKind {
    /// Each fragment hangs off a different end of the other.
    Dovetail,
    /// B lies entirely within A.
    AContainsB,
    /// A lies entirely within B.
    BContainsA,
}

/// A located overlap between A and B (or B's reverse complement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlap {
    /// Positive: A has this many bases before the overlap; negative: B does.
    pub begin_offset: i64,
    /// Positive: B has this many bases after the overlap; negative: A does.
    pub end_offset: i64,
    pub diffs: i64,
    /// Average of the lengths covered in A and B.
    pub length: i64,
    pub reverse_complement: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<EditScript>,
}

impl Overlap {
    /// Discrepancy rate over the overlap length.
    pub fn error_rate(&self) -> f64 {
        if self.length <= 0 {
            return 0.0;
        }
        self.diffs as f64 / self.length as f64
    }

    /// The `(a_hang, b_hang)` pair, with the fragment that starts first
    /// providing the positive a-hang.
    pub fn hangs(&self) -> (i64, i64) {
        let (ahang, bhang) = (self.begin_offset, self.end_offset);
        if ahang < 0 || (ahang == 0 && bhang > 0) {
            (-ahang, -bhang)
        } else {
            (ahang, bhang)
        }
    }

    pub fn kind(&self) -> OverlapKind {
        let (ahang, bhang) = (self.begin_offset, self.end_offset);
        if ahang < 0 || (ahang == 0 && bhang > 0) {
            if bhang >= 0 {
                OverlapKind::BContainsA
            } else {
                OverlapKind::Dovetail
            }
        } else if bhang <= 0 {
            OverlapKind::AContainsB
        } else {
            OverlapKind::Dovetail
        }
    }

    pub fn is_containment(&self) -> bool {
        self.kind() != OverlapKind::Dovetail
    }
}
