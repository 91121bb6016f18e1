//! Topic-based event bus for match events.
//!
//! The match worker publishes every reconciliation outcome to a topic, and
//! consumers subscribe only to the topics they need.

mod bus;
mod types;

pub use bus::{EventBus, Topic};
pub use types::{MatchEvent, RollbackCause};
