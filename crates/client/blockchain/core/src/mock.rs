//! In-memory ledger and prover for tests and local matches.
//!
//! The ledger keeps one snapshot per seat and applies every accepted
//! submission with the same engine the client uses: the acting seat sees the
//! full action, the other seat only its public part. Notifications go out on
//! a broadcast channel per match.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use game_core::{
    ActionKind, ActionOutcome, GameAction, GameConfig, GameEngine, GameState, HpPair, PlayerId, Seat,
    SequenceNumber, project,
};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

use crate::traits::{
    GameLedger, LedgerError, LedgerNotifier, LedgerReader, ProverError, TransactionSubmitter, WitnessProver,
};
use crate::types::{
    ConfirmedSnapshot, LedgerEvent, MatchId, ProofBlob, Submission, TransactionId, TxOutcome, WitnessRequest,
};

const NOTIFICATION_BUFFER: usize = 64;

/// Scripted verdict for the next submission.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scripted {
    Revert(String),
    Fail(String),
}

#[derive(Debug, Clone)]
struct Recorded {
    actor: Seat,
    private: ActionKind,
    public: ActionKind,
}

struct MatchRecord {
    genesis: [GameState; 2],
    views: [GameState; 2],
    history: Vec<Recorded>,
    notifier: broadcast::Sender<LedgerEvent>,
}

impl MatchRecord {
    fn sequence_number(&self) -> SequenceNumber {
        self.views[0].sequence_number
    }

    fn seat_of(&self, player: &PlayerId) -> Option<Seat> {
        self.views[0].seat_of(player)
    }

    fn replay(&mut self) {
        let mut views = self.genesis.clone();
        for (index, recorded) in self.history.iter().enumerate() {
            let sequence_number = index as SequenceNumber + 1;
            for seat in [Seat::One, Seat::Two] {
                let kind = if seat == recorded.actor {
                    recorded.private.clone()
                } else {
                    recorded.public.clone()
                };
                let view = &mut views[seat.index()];
                *view = project(view, &[GameAction::confirmed(sequence_number, kind)], true).state;
            }
        }
        self.views = views;
    }
}

#[derive(Default)]
struct Inner {
    next_match: u64,
    matches: HashMap<MatchId, MatchRecord>,
    scripted: VecDeque<Scripted>,
    muted: bool,
}

/// Mock ledger for testing without a network.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<Mutex<Inner>>,
    latency: Option<Duration>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every submission verdict by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, LedgerError> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::BackendError("ledger state poisoned".to_string()))
    }

    /// Opens a match in its standard opening position.
    pub fn create_match(&self, config: GameConfig, player1: PlayerId, player2: PlayerId) -> Result<MatchId, LedgerError> {
        let mut inner = self.lock()?;
        inner.next_match += 1;
        let match_id = MatchId(inner.next_match);
        let genesis = [
            GameState::opening(config.clone(), player1, player1, player2),
            GameState::opening(config, player2, player1, player2),
        ];
        let (notifier, _) = broadcast::channel(NOTIFICATION_BUFFER);
        inner.matches.insert(
            match_id,
            MatchRecord {
                views: genesis.clone(),
                genesis,
                history: Vec::new(),
                notifier,
            },
        );
        tracing::debug!(target: "ledger::memory", %match_id, "created match");
        Ok(match_id)
    }

    /// Makes the next submission revert with `reason` without touching state.
    pub fn revert_next(&self, reason: impl Into<String>) -> Result<(), LedgerError> {
        self.lock()?.scripted.push_back(Scripted::Revert(reason.into()));
        Ok(())
    }

    /// Makes the next submission fail with `reason` without touching state.
    pub fn fail_next(&self, reason: impl Into<String>) -> Result<(), LedgerError> {
        self.lock()?.scripted.push_back(Scripted::Fail(reason.into()));
        Ok(())
    }

    /// Stops (or resumes) pushing notifications; state keeps advancing.
    pub fn set_muted(&self, muted: bool) -> Result<(), LedgerError> {
        self.lock()?.muted = muted;
        Ok(())
    }

    /// Simulates a reorganization that drops everything after `sequence_number`.
    pub fn rewind_to(&self, match_id: MatchId, sequence_number: SequenceNumber) -> Result<(), LedgerError> {
        let mut inner = self.lock()?;
        let record = inner
            .matches
            .get_mut(&match_id)
            .ok_or(LedgerError::MatchNotFound(match_id))?;
        record.history.truncate(sequence_number as usize);
        record.replay();
        tracing::debug!(target: "ledger::memory", %match_id, sequence_number, "rewound match");
        Ok(())
    }

    /// Latest confirmed sequence number of a match.
    pub fn sequence_number(&self, match_id: MatchId) -> Result<SequenceNumber, LedgerError> {
        let inner = self.lock()?;
        inner
            .matches
            .get(&match_id)
            .map(MatchRecord::sequence_number)
            .ok_or(LedgerError::MatchNotFound(match_id))
    }

    fn accept(record: &mut MatchRecord, submission: &Submission) -> Result<(SequenceNumber, ActionKind), String> {
        let actor = record.views[0].mover().ok_or_else(|| "match is not in progress".to_string())?;
        let sequence_number = record.sequence_number() + 1;
        let view = &record.views[actor.index()];

        if requires_proof(view, &submission.action) && submission.proof.is_none() {
            return Err("hidden action submitted without proof".to_string());
        }
        let mut public = public_part(view, &submission.action);

        let mut next = view.clone();
        let outcome = GameEngine::new(&mut next)
            .execute(&GameAction::predicted(sequence_number, submission.action.clone()))
            .map_err(|error| error.to_string())?;
        if let (ActionKind::Attack(attack), ActionOutcome::Attacked(outcome)) = (&mut public, outcome) {
            let before = view
                .piece(attack.attacker_id)
                .zip(view.piece(attack.target_id))
                .map(|(attacker, target)| HpPair::new(attacker.hp, target.hp));
            attack.hp_before = before;
            attack.hp_after = Some(outcome.applied);
        }

        let other = actor.other();
        let confirmed = GameAction::confirmed(sequence_number, public.clone());
        record.views[other.index()] = project(&record.views[other.index()], &[confirmed], true).state;
        record.views[actor.index()] = next;
        record.history.push(Recorded {
            actor,
            private: submission.action.clone(),
            public: public.clone(),
        });
        Ok((sequence_number, public))
    }
}

/// Whether the acting player must attach a proof.
fn requires_proof(state: &GameState, action: &ActionKind) -> bool {
    match action {
        ActionKind::Summon(summon) => state
            .config
            .catalog
            .stats(summon.piece_type)
            .is_some_and(|stats| stats.hidden),
        ActionKind::Move(movement) => state.piece(movement.piece_id).is_some_and(|piece| piece.is_hidden()),
        ActionKind::Attack(attack) => state.piece(attack.attacker_id).is_some_and(|piece| piece.is_hidden()),
        ActionKind::EndTurn(_) => false,
    }
}

/// What the opponent is allowed to learn from an action.
fn public_part(state: &GameState, action: &ActionKind) -> ActionKind {
    let mut public = action.clone();
    match &mut public {
        ActionKind::Summon(summon) if requires_proof(state, action) => {
            summon.cell = None;
            summon.salt = None;
        }
        ActionKind::Move(movement) if requires_proof(state, action) => {
            movement.path.clear();
            movement.salt = None;
        }
        _ => {}
    }
    public
}

fn transaction_id(match_id: MatchId, sequence_number: SequenceNumber) -> TransactionId {
    let mut hasher = Sha256::new();
    hasher.update(match_id.0.to_be_bytes());
    hasher.update(sequence_number.to_be_bytes());
    TransactionId::from_bytes(hasher.finalize()[..16].to_vec())
}

#[async_trait]
impl LedgerReader for InMemoryLedger {
    async fn fetch_confirmed_state(
        &self,
        match_id: MatchId,
        viewer: &PlayerId,
    ) -> Result<ConfirmedSnapshot, LedgerError> {
        let inner = self.lock()?;
        let record = inner
            .matches
            .get(&match_id)
            .ok_or(LedgerError::MatchNotFound(match_id))?;
        let seat = record.seat_of(viewer).ok_or(LedgerError::NotAPlayer {
            match_id,
            player: *viewer,
        })?;
        Ok(ConfirmedSnapshot {
            match_id,
            state: record.views[seat.index()].clone(),
        })
    }
}

impl LedgerNotifier for InMemoryLedger {
    fn subscribe(&self, match_id: MatchId) -> Result<broadcast::Receiver<LedgerEvent>, LedgerError> {
        let inner = self.lock()?;
        inner
            .matches
            .get(&match_id)
            .map(|record| record.notifier.subscribe())
            .ok_or(LedgerError::MatchNotFound(match_id))
    }
}

#[async_trait]
impl TransactionSubmitter for InMemoryLedger {
    async fn submit(&self, submission: Submission) -> Result<TxOutcome, LedgerError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut inner = self.lock()?;
        if let Some(scripted) = inner.scripted.pop_front() {
            return Ok(match scripted {
                Scripted::Revert(reason) => TxOutcome::Reverted { reason },
                Scripted::Fail(reason) => TxOutcome::Failed { reason },
            });
        }

        let muted = inner.muted;
        let match_id = submission.match_id;
        let record = inner
            .matches
            .get_mut(&match_id)
            .ok_or(LedgerError::MatchNotFound(match_id))?;

        match Self::accept(record, &submission) {
            Ok((sequence_number, public)) => {
                tracing::debug!(
                    target: "ledger::memory",
                    %match_id,
                    sequence_number,
                    action = public.as_str(),
                    "confirmed submission"
                );
                if !muted {
                    // No subscribers is not an error for the ledger.
                    let _ = record.notifier.send(LedgerEvent::new(match_id, sequence_number, public));
                }
                Ok(TxOutcome::Confirmed {
                    transaction_id: transaction_id(match_id, sequence_number),
                    sequence_number,
                })
            }
            Err(reason) => {
                tracing::debug!(target: "ledger::memory", %match_id, %reason, "reverted submission");
                Ok(TxOutcome::Reverted { reason })
            }
        }
    }
}

impl GameLedger for InMemoryLedger {
    fn name(&self) -> &str {
        "InMemory"
    }

    fn network(&self) -> &str {
        "local"
    }
}

/// Prover stand-in: the "proof" is a SHA-256 digest of the witness.
#[derive(Clone, Debug, Default)]
pub struct MockProver {
    failing: bool,
}

impl MockProver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prover that rejects every witness.
    pub fn failing() -> Self {
        Self { failing: true }
    }
}

#[async_trait]
impl WitnessProver for MockProver {
    async fn prove(&self, request: WitnessRequest) -> Result<ProofBlob, ProverError> {
        if self.failing {
            return Err(ProverError::BackendError("mock prover configured to fail".to_string()));
        }
        if request.distance == 0 && request.from != request.to {
            return Err(ProverError::InvalidWitness("zero distance between distinct cells".to_string()));
        }
        let bytes = bincode::serialize(&request).map_err(|err| ProverError::InvalidWitness(err.to_string()))?;
        Ok(ProofBlob(Sha256::digest(&bytes).to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{Cell, EndTurnAction, PieceId, PieceType, Placement, Salt, SummonAction};

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);

    fn submission(match_id: MatchId, sequence_number: SequenceNumber, action: ActionKind) -> Submission {
        Submission {
            match_id,
            sequence_number,
            action,
            proof: None,
        }
    }

    #[tokio::test]
    async fn confirmed_submission_is_broadcast_and_fetched() {
        let ledger = InMemoryLedger::new();
        let match_id = ledger.create_match(GameConfig::default(), P1, P2).unwrap();
        let mut events = ledger.subscribe(match_id).unwrap();

        let outcome = ledger
            .submit(submission(match_id, 1, ActionKind::EndTurn(EndTurnAction::new(P1, 1))))
            .await
            .unwrap();
        assert!(outcome.is_confirmed());

        let event = events.recv().await.unwrap();
        assert_eq!(event.sequence_number(), 1);
        assert!(matches!(event, LedgerEvent::DidEndTurn { .. }));

        let snapshot = ledger.fetch_confirmed_state(match_id, &P2).await.unwrap();
        assert_eq!(snapshot.sequence_number(), 1);
        assert!(snapshot.state.is_turn_of(&P2));
    }

    #[tokio::test]
    async fn illegal_submission_reverts() {
        let ledger = InMemoryLedger::new();
        let match_id = ledger.create_match(GameConfig::default(), P1, P2).unwrap();
        let outcome = ledger
            .submit(submission(match_id, 1, ActionKind::EndTurn(EndTurnAction::new(P2, 1))))
            .await
            .unwrap();
        assert!(matches!(outcome, TxOutcome::Reverted { .. }));
        assert_eq!(ledger.sequence_number(match_id).unwrap(), 0);
    }

    #[tokio::test]
    async fn hidden_summon_is_private_to_its_owner() {
        let ledger = InMemoryLedger::new();
        let config = GameConfig::default();
        let match_id = ledger.create_match(config, P1, P2).unwrap();
        // Reach turn 4 so player 2 can afford a submarine.
        for (player, turn) in [(P1, 1), (P2, 2), (P1, 3)] {
            ledger
                .submit(submission(
                    match_id,
                    turn as u64,
                    ActionKind::EndTurn(EndTurnAction::new(player, turn)),
                ))
                .await
                .unwrap();
        }
        let summon = SummonAction::new(P2, PieceId(3), PieceType::Submarine, Cell::new(2, 6)).with_salt(Salt(5));
        let unproven = ledger
            .submit(submission(match_id, 4, ActionKind::Summon(summon)))
            .await
            .unwrap();
        assert!(matches!(unproven, TxOutcome::Reverted { .. }));

        let mut proven = submission(match_id, 4, ActionKind::Summon(summon));
        proven.proof = Some(ProofBlob(vec![1]));
        assert!(ledger.submit(proven).await.unwrap().is_confirmed());

        let owner = ledger.fetch_confirmed_state(match_id, &P2).await.unwrap();
        let opponent = ledger.fetch_confirmed_state(match_id, &P1).await.unwrap();
        assert_eq!(owner.state.piece(PieceId(3)).unwrap().location(), Some(Cell::new(2, 6)));
        assert_eq!(opponent.state.piece(PieceId(3)).unwrap().location(), None);
        assert!(matches!(
            opponent.state.piece(PieceId(3)).unwrap().placement,
            Placement::Hidden(_)
        ));
    }

    #[tokio::test]
    async fn rewind_replays_remaining_history() {
        let ledger = InMemoryLedger::new();
        let match_id = ledger.create_match(GameConfig::default(), P1, P2).unwrap();
        // One mana on turn 1 is not enough for a cruiser.
        let outcome = ledger
            .submit(submission(
                match_id,
                1,
                ActionKind::Summon(SummonAction::new(P1, PieceId(3), PieceType::Cruiser, Cell::new(2, 0))),
            ))
            .await
            .unwrap();
        assert!(matches!(outcome, TxOutcome::Reverted { .. }));

        for (player, turn) in [(P1, 1), (P2, 2)] {
            let outcome = ledger
                .submit(submission(
                    match_id,
                    turn as u64,
                    ActionKind::EndTurn(EndTurnAction::new(player, turn)),
                ))
                .await
                .unwrap();
            assert!(outcome.is_confirmed());
        }
        assert_eq!(ledger.sequence_number(match_id).unwrap(), 2);

        ledger.rewind_to(match_id, 1).unwrap();
        let snapshot = ledger.fetch_confirmed_state(match_id, &P1).await.unwrap();
        assert_eq!(snapshot.sequence_number(), 1);
        assert!(snapshot.state.is_turn_of(&P2));
        assert_eq!(snapshot.state.turn_number, 2);
    }

    #[tokio::test]
    async fn scripted_failures_leave_state_alone() {
        let ledger = InMemoryLedger::new();
        let match_id = ledger.create_match(GameConfig::default(), P1, P2).unwrap();
        ledger.fail_next("rpc timeout").unwrap();
        let outcome = ledger
            .submit(submission(match_id, 1, ActionKind::EndTurn(EndTurnAction::new(P1, 1))))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TxOutcome::Failed {
                reason: "rpc timeout".to_string()
            }
        );
        assert_eq!(ledger.sequence_number(match_id).unwrap(), 0);
    }

    #[tokio::test]
    async fn mock_prover_digests_witness() {
        let request = WitnessRequest {
            kind: game_core::WitnessKind::Move,
            from: Cell::new(1, 1),
            to: Cell::new(1, 3),
            salts: vec![Salt(1), Salt(2)],
            distance: 2,
            dimensions: game_core::BoardDimensions::new(7, 7),
        };
        let proof = MockProver::new().prove(request.clone()).await.unwrap();
        assert_eq!(proof.len(), 32);
        assert!(MockProver::failing().prove(request).await.is_err());
    }
}
