//! Worker tasks that back the runtime orchestration.
//!
//! The match worker is the single execution context of a match; submission
//! tasks it spawns report back to it instead of touching match state.

mod match_worker;

pub use match_worker::{Command, MatchWorker};
