#![warn(clippy::unwrap_used)]

//! Golden-record subsystem: merge planning, the candidate state machine,
//! promotion of unmatched records, and CSV export.

pub mod export;
pub mod planner;
pub mod service;

pub use planner::auto_select_best_values;
pub use service::{
    CandidateStats, GoldenRecordDetail, GoldenRecordService, MatchCandidateDetail, ReviewDecision,
};
