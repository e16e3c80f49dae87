//! dpcompare Core Library
//!
//! Pairwise overlap detection for shotgun fragments: a thresholded
//! bit-vector boundary scan locates overlap ends, and O(ND) or affine-gap
//! alignment recovers the overlap start and edit script.

pub mod types;
pub mod seq;
pub mod prob;
pub mod context;
pub mod boundary;
pub mod greedy;
pub mod affine;
pub mod tail;
pub mod branch;
pub mod trace;
pub mod compare;

// Re-export commonly used types and functions
pub use types::{CompareError, CompareMode, CompareParams, CompareResult, Overlap, OverlapKind};
pub use context::AlignContext;
pub use boundary::BoundaryHit;
pub use greedy::{GreedyAlignment, strip_terminal_gaps};
pub use affine::AffineAlignment;
pub use branch::BranchPoint;
pub use prob::{BinomialModel, ThresholdTable, build_threshold_table};
pub use seq::{reverse_complement, complement_base};
pub use trace::{EditScript, AlignmentSummary, OverlapReport, summarize};

/// Version information for the dpcompare core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
