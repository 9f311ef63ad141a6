//! The merge pipeline: reconcile a freshly generated declaration tree with
//! the existing, possibly hand-edited file at the same location.
//!
//! Split in two layers:
//!
//! - [`combine`] — small field-level combinators (unions, line appends,
//!   first-non-empty picks) plus the generic identity-keyed tree-zip.
//! - [`engine`] — the recursive walk that applies variant-specific rules and
//!   accumulates [`crate::model::Conflict`] records along the way.

pub mod combine;
pub mod engine;

pub use engine::{MergeOutcome, UnitMergeOutcome, merge, merge_unit};
