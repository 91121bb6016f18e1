//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, the action log, intent checks
//! and ledger access so clients can bubble them up with consistent context.
use client_blockchain_core::LedgerError;
use game_core::{ErrorSeverity, GameError, IntentError, SequenceNumber};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::log::ActionLogError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Local history can no longer be reconciled with the ledger.
///
/// Only a resync from a freshly fetched snapshot recovers from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyFault {
    #[error("two different confirmed actions claim sequence {sequence_number}")]
    ConflictingConfirmed { sequence_number: SequenceNumber },

    #[error("confirmed snapshot at sequence {sequence_number} belongs to another match")]
    ForeignSnapshot { sequence_number: SequenceNumber },
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Intent(#[from] IntentError),

    #[error("sequence {0} already holds a pending prediction")]
    SlotPending(SequenceNumber),

    #[error(transparent)]
    ActionLog(#[from] ActionLogError),

    #[error("consistency fault: {0}")]
    Consistency(#[from] ConsistencyFault),

    #[error("match is faulted and waits for a resync")]
    Faulted,

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("runtime requires a ledger to be configured before building")]
    MissingLedger,

    #[error("runtime requires a prover to be configured before building")]
    MissingProver,

    #[error("match worker command channel closed")]
    CommandChannelClosed,

    #[error("match worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("match worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Intent(error) => error.severity(),
            RuntimeError::SlotPending(_) => ErrorSeverity::Recoverable,
            RuntimeError::ActionLog(_) => ErrorSeverity::Internal,
            RuntimeError::Consistency(_) | RuntimeError::Faulted => ErrorSeverity::Fatal,
            RuntimeError::Ledger(_) => ErrorSeverity::Recoverable,
            RuntimeError::MissingLedger | RuntimeError::MissingProver => ErrorSeverity::Validation,
            RuntimeError::CommandChannelClosed
            | RuntimeError::ReplyChannelClosed(_)
            | RuntimeError::WorkerJoin(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::Intent(error) => error.error_code(),
            RuntimeError::SlotPending(_) => "RUNTIME_SLOT_PENDING",
            RuntimeError::ActionLog(_) => "RUNTIME_ACTION_LOG",
            RuntimeError::Consistency(_) => "RUNTIME_CONSISTENCY_FAULT",
            RuntimeError::Faulted => "RUNTIME_FAULTED",
            RuntimeError::Ledger(_) => "RUNTIME_LEDGER",
            RuntimeError::MissingLedger => "RUNTIME_MISSING_LEDGER",
            RuntimeError::MissingProver => "RUNTIME_MISSING_PROVER",
            RuntimeError::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            RuntimeError::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            RuntimeError::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
        }
    }
}
