//! Match worker that owns the [`Match`] of one game.
//!
//! Every stimulus (client commands, ledger notifications, poll ticks and
//! submission outcomes) is serialized onto this task, so the action log and
//! both snapshots only ever change between two `select!` iterations.

use std::sync::Arc;
use std::time::Duration;

use client_blockchain_core::{
    GameLedger, LedgerError, LedgerEvent, MatchId, Submission, TxOutcome, WitnessProver, WitnessRequest,
};
use game_core::{Discrepancy, GameAction, GameState, Intent, Salt, SequenceNumber, WitnessPlan};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::{Result, RuntimeError};
use crate::events::{EventBus, MatchEvent, RollbackCause};
use crate::reconcile::Match;

/// Commands that can be sent to the match worker
pub enum Command {
    /// Validate, predict and submit a local intent.
    Intent {
        intent: Intent,
        reply: oneshot::Sender<Result<GameAction>>,
    },
    /// Fetch the confirmed state now instead of on the next tick.
    Refresh { reply: oneshot::Sender<Result<()>> },
    QueryConfirmed { reply: oneshot::Sender<GameState> },
    QueryLatest { reply: oneshot::Sender<GameState> },
    QueryActions { reply: oneshot::Sender<Vec<GameAction>> },
    QueryDiscrepancies { reply: oneshot::Sender<Vec<Discrepancy>> },
}

/// Ledger verdict for one prediction, sent back by its submission task.
struct SubmissionReport {
    sequence_number: SequenceNumber,
    outcome: TxOutcome,
}

pub struct MatchWorker {
    game: Match,
    ledger: Arc<dyn GameLedger>,
    prover: Arc<dyn WitnessProver>,
    command_rx: mpsc::Receiver<Command>,
    report_tx: mpsc::UnboundedSender<SubmissionReport>,
    report_rx: mpsc::UnboundedReceiver<SubmissionReport>,
    ledger_rx: Option<broadcast::Receiver<LedgerEvent>>,
    event_bus: EventBus,
    poll_interval: Duration,
}

impl MatchWorker {
    pub fn new(
        game: Match,
        ledger: Arc<dyn GameLedger>,
        prover: Arc<dyn WitnessProver>,
        command_rx: mpsc::Receiver<Command>,
        ledger_rx: broadcast::Receiver<LedgerEvent>,
        event_bus: EventBus,
        poll_interval: Duration,
    ) -> Self {
        info!(
            target: "runtime::worker",
            match_id = %game.match_id(),
            viewer = %game.viewer(),
            sequence_number = game.confirmed().sequence_number,
            "match worker initialized"
        );
        let (report_tx, report_rx) = mpsc::unbounded_channel();

        Self {
            game,
            ledger,
            prover,
            command_rx,
            report_tx,
            report_rx,
            ledger_rx: Some(ledger_rx),
            event_bus,
            poll_interval,
        }
    }

    /// Main worker loop; ends once every handle is dropped.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                Some(report) = self.report_rx.recv() => {
                    self.handle_report(report);
                }
                event = next_ledger_event(&mut self.ledger_rx) => {
                    self.handle_ledger_event(event).await;
                }
                _ = ticker.tick() => {
                    if let Err(error) = self.poll().await {
                        warn!(target: "runtime::worker", %error, "confirmed state poll failed");
                    }
                }
            }
        }

        debug!(target: "runtime::worker", match_id = %self.game.match_id(), "match worker stopped");
    }

    async fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Intent { intent, reply } => {
                let result = self.handle_intent(intent);
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Intent reply channel closed (caller dropped)");
                }
            }
            Command::Refresh { reply } => {
                let result = self.poll().await;
                if reply.send(result).is_err() {
                    debug!(target: "runtime::worker", "Refresh reply channel closed (caller dropped)");
                }
            }
            Command::QueryConfirmed { reply } => {
                if reply.send(self.game.confirmed().clone()).is_err() {
                    debug!(target: "runtime::worker", "QueryConfirmed reply channel closed (caller dropped)");
                }
            }
            Command::QueryLatest { reply } => {
                if reply.send(self.game.latest().clone()).is_err() {
                    debug!(target: "runtime::worker", "QueryLatest reply channel closed (caller dropped)");
                }
            }
            Command::QueryActions { reply } => {
                if reply.send(self.game.actions()).is_err() {
                    debug!(target: "runtime::worker", "QueryActions reply channel closed (caller dropped)");
                }
            }
            Command::QueryDiscrepancies { reply } => {
                if reply.send(self.game.discrepancies().to_vec()).is_err() {
                    debug!(target: "runtime::worker", "QueryDiscrepancies reply channel closed (caller dropped)");
                }
            }
        }
    }

    fn handle_intent(&mut self, intent: Intent) -> Result<GameAction> {
        let fresh_salt = Salt(rand::random());
        let prediction = self.game.on_local_intent(&intent, fresh_salt)?;

        self.event_bus.publish(MatchEvent::ActionPredicted {
            action: prediction.action.clone(),
            state: Box::new(self.game.latest().clone()),
        });
        self.spawn_submission(prediction.action.clone(), prediction.witness);
        Ok(prediction.action)
    }

    /// Proves (when needed) and submits off the worker; the verdict comes
    /// back as a [`SubmissionReport`].
    fn spawn_submission(&self, action: GameAction, witness: Option<WitnessPlan>) {
        let ledger = Arc::clone(&self.ledger);
        let prover = Arc::clone(&self.prover);
        let report_tx = self.report_tx.clone();
        let match_id = self.game.match_id();

        tokio::spawn(async move {
            let sequence_number = action.sequence_number;
            let outcome = submit(ledger.as_ref(), prover.as_ref(), match_id, action, witness).await;
            if report_tx.send(SubmissionReport { sequence_number, outcome }).is_err() {
                debug!(target: "runtime::worker", sequence_number, "worker gone before submission outcome");
            }
        });
    }

    fn handle_report(&mut self, report: SubmissionReport) {
        let SubmissionReport {
            sequence_number,
            outcome,
        } = report;

        let (rolled_back, cause) = match outcome {
            TxOutcome::Confirmed {
                transaction_id,
                sequence_number: assigned,
            } => {
                debug!(
                    target: "runtime::worker",
                    sequence_number,
                    assigned,
                    %transaction_id,
                    "submission confirmed"
                );
                self.game.on_submission_confirmed(sequence_number, assigned);
                return;
            }
            TxOutcome::Reverted { reason } => (
                self.game.on_submission_reverted(sequence_number),
                RollbackCause::Reverted { reason },
            ),
            TxOutcome::Failed { reason } => (
                self.game.on_submission_failed(sequence_number),
                RollbackCause::Failed { reason },
            ),
        };

        if let Some(action) = rolled_back {
            info!(
                target: "runtime::worker",
                sequence_number,
                action = action.kind.as_str(),
                reason = cause.reason(),
                "prediction rolled back"
            );
            self.event_bus.publish(MatchEvent::ActionRolledBack {
                action,
                cause,
                state: Box::new(self.game.latest().clone()),
            });
        }
    }

    async fn handle_ledger_event(&mut self, event: std::result::Result<LedgerEvent, RecvError>) {
        match event {
            Ok(event) => {
                let sequence_number = event.sequence_number();
                match self.game.on_ledger_event(event) {
                    Ok(Some(update)) => self.event_bus.publish(update),
                    Ok(None) => {}
                    Err(error) => self.report_error(sequence_number, error),
                }
                if self.game.needs_refresh()
                    && let Err(error) = self.poll().await
                {
                    warn!(target: "runtime::worker", %error, "refresh after notification failed");
                }
            }
            Err(RecvError::Lagged(missed)) => {
                warn!(target: "runtime::worker", missed, "ledger notifications lagged; refreshing");
                if let Err(error) = self.poll().await {
                    warn!(target: "runtime::worker", %error, "refresh after lag failed");
                }
            }
            Err(RecvError::Closed) => {
                warn!(target: "runtime::worker", "ledger notifications closed; polling only");
                self.ledger_rx = None;
            }
        }
    }

    /// Fetches the confirmed state and reconciles with it, resyncing a
    /// faulted match from scratch.
    async fn poll(&mut self) -> Result<()> {
        let snapshot = self
            .ledger
            .fetch_confirmed_state(self.game.match_id(), &self.game.viewer())
            .await?;
        let sequence_number = snapshot.sequence_number();

        let result = if self.game.is_faulted() {
            self.game.resync(snapshot).map(Some)
        } else {
            self.game.on_confirmed_update(snapshot)
        };

        match result {
            Ok(Some(update)) => {
                self.event_bus.publish(update);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(error) => {
                self.report_error(sequence_number, error);
                Ok(())
            }
        }
    }

    fn report_error(&self, sequence_number: SequenceNumber, error: RuntimeError) {
        match error {
            RuntimeError::Consistency(fault) => {
                self.event_bus.publish(MatchEvent::ConsistencyFault {
                    sequence_number,
                    detail: fault.to_string(),
                });
            }
            RuntimeError::Faulted => {
                debug!(target: "runtime::worker", sequence_number, "ignored while faulted");
            }
            other => {
                warn!(target: "runtime::worker", sequence_number, error = %other, "reconciliation failed");
            }
        }
    }
}

async fn next_ledger_event(
    rx: &mut Option<broadcast::Receiver<LedgerEvent>>,
) -> std::result::Result<LedgerEvent, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Attaches a proof when one is needed and hands the action to the ledger.
///
/// Every failure before the ledger's verdict counts as [`TxOutcome::Failed`].
async fn submit(
    ledger: &dyn GameLedger,
    prover: &dyn WitnessProver,
    match_id: MatchId,
    action: GameAction,
    witness: Option<WitnessPlan>,
) -> TxOutcome {
    let proof = match witness {
        Some(plan) => match prover.prove(WitnessRequest::from(plan)).await {
            Ok(proof) => Some(proof),
            Err(error) => {
                return TxOutcome::Failed {
                    reason: error.to_string(),
                };
            }
        },
        None => None,
    };

    let submission = Submission {
        match_id,
        sequence_number: action.sequence_number,
        action: action.kind,
        proof,
    };
    match ledger.submit(submission).await {
        Ok(outcome) => outcome,
        Err(error) => TxOutcome::Failed {
            reason: transport_reason(error),
        },
    }
}

fn transport_reason(error: LedgerError) -> String {
    format!("transport: {error}")
}
