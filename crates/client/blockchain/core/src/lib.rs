//! Ledger abstraction layer for Ghostfleet matches.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: GameLedger (composite trait)
//!          ├── LedgerReader
//!          ├── LedgerNotifier
//!          └── TransactionSubmitter
//!
//! Layer 1: Domain Traits (game concepts)
//!          └── WitnessProver (separate collaborator)
//! ```
//!
//! - **Layer 1 (Domain)**: confirmed-state reads, push notifications,
//!   transaction submission and proof generation, each usable on its own
//! - **Layer 2 (Composite)**: what the runtime needs from one ledger
//!
//! # Usage
//!
//! ```ignore
//! use client_blockchain_core::{GameLedger, Submission};
//!
//! async fn play(ledger: &dyn GameLedger, submission: Submission) {
//!     let outcome = ledger.submit(submission).await?;
//!     let snapshot = ledger.fetch_confirmed_state(match_id, &viewer).await?;
//! }
//! ```

pub mod traits;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use traits::{
    GameLedger, LedgerError, LedgerNotifier, LedgerReader, ProverError, TransactionSubmitter, WitnessProver,
};

pub use types::{
    ConfirmedSnapshot, LedgerEvent, MatchId, ProofBlob, Submission, TransactionId, TxOutcome, WitnessRequest,
};

#[cfg(any(test, feature = "mock"))]
pub use mock::{InMemoryLedger, MockProver};
