//! Runtime orchestration for a match played against a remote ledger.
//!
//! This crate wires the deterministic rules of `game-core` to the ledger
//! collaborators of `client-blockchain-core`. Consumers embed
//! [`MatchRuntime`] to join a match, submit intents and subscribe to
//! reconciliation events through [`MatchHandle`].
//!
//! Modules are organized by responsibility:
//! - [`log`] keeps the sequence-numbered action history
//! - [`reconcile`] merges ledger truth with local predictions
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides topic-based event bus for flexible event routing
//! - `workers` keeps the background task internal to the crate
pub mod api;
pub mod events;
pub mod log;
pub mod reconcile;
pub mod runtime;

mod workers;

pub use api::{ConsistencyFault, MatchHandle, Result, RuntimeError};
pub use events::{EventBus, MatchEvent, RollbackCause, Topic};
pub use log::{ActionLog, ActionLogError, Insertion};
pub use reconcile::{Match, Prediction};
pub use runtime::{MatchRuntime, RuntimeBuilder, RuntimeConfig};
