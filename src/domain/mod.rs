//! Domain types for the clip pipeline.
//!
//! - Action: stage identifiers and canonical ordering
//! - Section: timed ranges from sidecar files
//! - Operations: raw and separated work items
//! - RunReport: per-run summary

pub mod action;
pub mod operation;
pub mod report;
pub mod section;

pub use action::{actions_for_phase, canonical_order, Action, Phase};
pub use operation::{file_stem, RawSourceOperation, SeparatedSourceOperation};
pub use report::RunReport;
pub use section::Section;
