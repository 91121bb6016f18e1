//! Public runtime API surface.
//!
//! This module gathers the types exposed to consumers of the runtime crate so
//! other layers can stay focused on reconciliation and workers.

pub mod errors;
pub mod handle;

pub use errors::{ConsistencyFault, Result, RuntimeError};
pub use handle::MatchHandle;
