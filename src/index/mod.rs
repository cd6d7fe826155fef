//! In-memory indices over the logbook's events.
//!
//! The identity map and the chronological index describe the same event
//! set and are repaired together by every mutation.

mod chronological;
mod dual;

pub use chronological::ChronologicalIndex;
pub use dual::DualIndex;
