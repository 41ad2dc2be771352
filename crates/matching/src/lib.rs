#![warn(clippy::unwrap_used)]

//! Field-weighted fuzzy matching: normalizers, similarity kernels, the
//! per-field and record comparators, and the pairwise matching engine.

pub mod comparator;
pub mod engine;
pub mod normalize;
pub mod similarity;

pub use comparator::{compare_field, compare_records, default_field_weights};
pub use engine::{MatchRunConfig, MatchingEngine, DEFAULT_THRESHOLD};
