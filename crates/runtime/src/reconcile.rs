//! Reconciliation of ledger truth with local predictions.
//!
//! A [`Match`] owns the action log of one match together with the last
//! confirmed snapshot adopted from the ledger (its base). Both read views are
//! rebuilt from the base and the log after every mutation, never patched:
//! `confirmed` folds confirmed entries only, `latest` folds everything.
use std::cmp::Ordering;

use client_blockchain_core::{ConfirmedSnapshot, LedgerEvent, MatchId};
use game_core::{
    ActionKind, Discrepancy, GameAction, GameState, HiddenPlacement, Intent, Placement, PlayerId, Salt,
    SequenceNumber, WitnessPlan, project, validate_intent,
};
use tracing::{debug, warn};

use crate::api::{ConsistencyFault, Result, RuntimeError};
use crate::events::MatchEvent;
use crate::log::{ActionLog, ActionLogError, Insertion};

/// A local intent that made it into the log as a prediction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub action: GameAction,
    /// Inputs for the proof that must accompany the submission.
    pub witness: Option<WitnessPlan>,
}

pub struct Match {
    match_id: MatchId,
    viewer: PlayerId,
    base: GameState,
    log: ActionLog,
    confirmed: GameState,
    latest: GameState,
    discrepancies: Vec<Discrepancy>,
    fault: Option<ConsistencyFault>,
    stale: bool,
    /// Own hidden summons and moves dropped from the log while their
    /// transactions may still land, keyed by provisional sequence number.
    withheld: Vec<(SequenceNumber, ActionKind)>,
}

impl Match {
    /// Starts a synced match from the first confirmed snapshot.
    pub fn new(snapshot: ConfirmedSnapshot) -> Self {
        let ConfirmedSnapshot { match_id, state } = snapshot;
        Self {
            match_id,
            viewer: state.viewer,
            confirmed: state.clone(),
            latest: state.clone(),
            base: state,
            log: ActionLog::new(),
            discrepancies: Vec::new(),
            fault: None,
            stale: false,
            withheld: Vec::new(),
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn viewer(&self) -> PlayerId {
        self.viewer
    }

    /// Snapshot made of confirmed actions only.
    pub fn confirmed(&self) -> &GameState {
        &self.confirmed
    }

    /// Confirmed snapshot with every pending prediction folded on top.
    pub fn latest(&self) -> &GameState {
        &self.latest
    }

    /// Log entries above the base, by sequence number.
    pub fn actions(&self) -> Vec<GameAction> {
        self.log.entries_in_order().cloned().collect()
    }

    pub fn log(&self) -> &ActionLog {
        &self.log
    }

    /// Entries the last replay skipped or adjusted.
    pub fn discrepancies(&self) -> &[Discrepancy] {
        &self.discrepancies
    }

    pub fn fault(&self) -> Option<&ConsistencyFault> {
        self.fault.as_ref()
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// True when a notification arrived ahead of a missing one.
    pub fn needs_refresh(&self) -> bool {
        self.stale || self.fault.is_some()
    }

    /// Compares a freshly fetched confirmed snapshot with held history.
    ///
    /// A newer snapshot advances the base; an older one is a rewind that drops
    /// every prediction and keeps confirmed entries only where they continue
    /// the new base. An equal sequence number changes nothing.
    pub fn on_confirmed_update(&mut self, snapshot: ConfirmedSnapshot) -> Result<Option<MatchEvent>> {
        self.ensure_healthy()?;
        self.ensure_same_match(&snapshot)?;

        let remote = snapshot.sequence_number();
        let local = self.confirmed.sequence_number;
        self.stale = false;

        match remote.cmp(&local) {
            Ordering::Equal => Ok(None),
            Ordering::Greater => {
                self.adopt(snapshot.state);
                let pruned = self.log.prune_through(remote);
                self.recompute();
                debug!(
                    target: "runtime::match",
                    match_id = %self.match_id,
                    from = local,
                    to = remote,
                    pruned = pruned.len(),
                    "confirmed state advanced"
                );
                Ok(Some(MatchEvent::StateAdvanced {
                    state: Box::new(self.latest.clone()),
                    actions: self.actions(),
                }))
            }
            Ordering::Less => {
                let dropped = self.log.retain_after_rewind(remote);
                self.withhold(&dropped);
                self.adopt(snapshot.state);
                self.recompute();
                warn!(
                    target: "runtime::match",
                    match_id = %self.match_id,
                    from = local,
                    to = remote,
                    dropped = dropped.len(),
                    "confirmed state rewound"
                );
                Ok(Some(MatchEvent::StateRewinded {
                    state: Box::new(self.latest.clone()),
                    actions: self.actions(),
                }))
            }
        }
    }

    /// Folds a confirmed-action notification into the log.
    pub fn on_ledger_event(&mut self, event: LedgerEvent) -> Result<Option<MatchEvent>> {
        self.ensure_healthy()?;
        if event.match_id() != self.match_id {
            return Ok(None);
        }

        let mut action = event.into_action();
        let sequence_number = action.sequence_number;
        let before = self.confirmed.sequence_number;
        if sequence_number <= self.base.sequence_number {
            return Ok(None);
        }
        if sequence_number > before + 1 {
            debug!(
                target: "runtime::match",
                match_id = %self.match_id,
                sequence_number,
                confirmed = before,
                "notification ahead of history; waiting for refresh"
            );
            self.stale = true;
            return Ok(None);
        }

        self.restore_withheld(&mut action);
        match self.log.add_action(action) {
            Ok(Insertion::Duplicate) => return Ok(None),
            Ok(Insertion::Resolved(prediction)) => {
                debug!(
                    target: "runtime::match",
                    match_id = %self.match_id,
                    sequence_number,
                    action = prediction.kind.as_str(),
                    "prediction resolved"
                );
            }
            Ok(Insertion::Inserted) => {}
            Err(ActionLogError::ConfirmedConflict { sequence_number, .. }) => {
                return Err(self.raise(ConsistencyFault::ConflictingConfirmed { sequence_number }));
            }
            Err(error) => return Err(error.into()),
        }

        self.recompute();
        if self.confirmed.sequence_number > before {
            Ok(Some(MatchEvent::StateAdvanced {
                state: Box::new(self.latest.clone()),
                actions: self.actions(),
            }))
        } else {
            Ok(None)
        }
    }

    /// Checks `intent` against the predicted snapshot and appends it as a
    /// prediction on the next free sequence number.
    ///
    /// Nothing is appended when the intent is illegal.
    pub fn on_local_intent(&mut self, intent: &Intent, fresh_salt: Salt) -> Result<Prediction> {
        self.ensure_healthy()?;

        let planned = validate_intent(&self.latest, &self.viewer, intent, fresh_salt)?;
        let sequence_number = self.latest.sequence_number + 1;
        if self.log.get(sequence_number).is_some() {
            return Err(RuntimeError::SlotPending(sequence_number));
        }

        let action = GameAction::predicted(sequence_number, planned.kind);
        self.log.add_action(action.clone())?;
        self.recompute();
        debug!(
            target: "runtime::match",
            match_id = %self.match_id,
            sequence_number,
            action = action.kind.as_str(),
            "prediction appended"
        );

        Ok(Prediction {
            action,
            witness: planned.witness,
        })
    }

    /// Moves a prediction to the slot the ledger actually assigned.
    pub fn on_submission_confirmed(&mut self, provisional: SequenceNumber, assigned: SequenceNumber) {
        if provisional == assigned {
            return;
        }
        let Ok(prediction) = self.log.mark_failed(provisional) else {
            return;
        };
        let relabeled = GameAction::predicted(assigned, prediction.kind);
        if self.log.enrich_confirmed(&relabeled) {
            debug!(
                target: "runtime::match",
                match_id = %self.match_id,
                provisional,
                assigned,
                "prediction already confirmed"
            );
        } else if let Err(error) = self.log.add_action(relabeled) {
            warn!(
                target: "runtime::match",
                match_id = %self.match_id,
                provisional,
                assigned,
                %error,
                "relabeled prediction dropped"
            );
        }
        self.recompute();
    }

    /// Rolls back a prediction whose transaction never reached the ledger.
    pub fn on_submission_failed(&mut self, sequence_number: SequenceNumber) -> Option<GameAction> {
        self.forget_withheld(sequence_number);
        self.roll_back(sequence_number)
    }

    /// Rolls back a prediction the ledger rejected.
    pub fn on_submission_reverted(&mut self, sequence_number: SequenceNumber) -> Option<GameAction> {
        self.forget_withheld(sequence_number);
        self.roll_back(sequence_number)
    }

    /// Rebuilds history from scratch on top of `snapshot`; clears a fault.
    pub fn resync(&mut self, snapshot: ConfirmedSnapshot) -> Result<MatchEvent> {
        self.ensure_same_match(&snapshot)?;
        let pending: Vec<GameAction> = self.log.pending().cloned().collect();
        self.withhold(&pending);
        self.log.clear();
        self.adopt(snapshot.state);
        self.fault = None;
        self.stale = false;
        self.recompute();
        debug!(
            target: "runtime::match",
            match_id = %self.match_id,
            sequence_number = self.confirmed.sequence_number,
            "resynced"
        );
        Ok(MatchEvent::Resynced {
            state: Box::new(self.latest.clone()),
        })
    }

    fn roll_back(&mut self, sequence_number: SequenceNumber) -> Option<GameAction> {
        match self.log.mark_failed(sequence_number) {
            Ok(action) => {
                self.recompute();
                Some(action)
            }
            Err(error) => {
                debug!(target: "runtime::match", match_id = %self.match_id, %error, "nothing to roll back");
                None
            }
        }
    }

    fn ensure_healthy(&self) -> Result<()> {
        match self.fault {
            Some(_) => Err(RuntimeError::Faulted),
            None => Ok(()),
        }
    }

    fn ensure_same_match(&mut self, snapshot: &ConfirmedSnapshot) -> Result<()> {
        let same_players = snapshot
            .state
            .players
            .iter()
            .zip(self.base.players.iter())
            .all(|(theirs, ours)| theirs.address == ours.address);
        if snapshot.match_id == self.match_id && same_players {
            return Ok(());
        }
        Err(self.raise(ConsistencyFault::ForeignSnapshot {
            sequence_number: snapshot.sequence_number(),
        }))
    }

    fn raise(&mut self, fault: ConsistencyFault) -> RuntimeError {
        warn!(target: "runtime::match", match_id = %self.match_id, %fault, "consistency fault");
        self.fault = Some(fault.clone());
        RuntimeError::Consistency(fault)
    }

    fn adopt(&mut self, mut state: GameState) {
        state.viewer = self.viewer;
        retain_own_secrets(&mut state, &[&self.latest, &self.confirmed], &self.viewer);
        self.restore_withheld_summons(&mut state);
        self.base = state;
    }

    /// Keeps the private half of dropped predictions around until their
    /// transactions show up on the ledger or are reported as failed.
    fn withhold(&mut self, dropped: &[GameAction]) {
        for action in dropped {
            if carries_secret(&action.kind) {
                self.withheld.push((action.sequence_number, action.kind.clone()));
            }
        }
    }

    fn forget_withheld(&mut self, sequence_number: SequenceNumber) {
        self.withheld.retain(|(provisional, _)| *provisional != sequence_number);
    }

    /// Fills a public notification with the private detail of the matching
    /// withheld prediction, consuming it.
    fn restore_withheld(&mut self, action: &mut GameAction) {
        // A live prediction in the same slot knows better than a stale stash.
        let held = self.log.get(action.sequence_number);
        if held.is_some_and(|held| held.from_local_data && is_public_half_of(&action.kind, &held.kind)) {
            return;
        }
        let Some(index) = self
            .withheld
            .iter()
            .position(|(_, local)| is_public_half_of(&action.kind, local))
        else {
            return;
        };
        let (provisional, local) = self.withheld.remove(index);
        action.kind.absorb_local_detail(&local);
        debug!(
            target: "runtime::match",
            match_id = %self.match_id,
            provisional,
            sequence_number = action.sequence_number,
            "withheld detail restored"
        );
    }

    /// A snapshot that already holds a withheld summon gets its placement
    /// back. Moves cannot be matched against a snapshot and wait for their
    /// notification instead.
    fn restore_withheld_summons(&mut self, state: &mut GameState) {
        let viewer = self.viewer;
        self.withheld.retain(|(_, local)| {
            let ActionKind::Summon(summon) = local else {
                return true;
            };
            let (Some(cell), Some(salt)) = (summon.cell, summon.salt) else {
                return true;
            };
            match state.pieces.get_mut(&summon.piece_id) {
                Some(piece)
                    if piece.owner == viewer
                        && piece.piece_type == summon.piece_type
                        && piece.placement == Placement::Hidden(HiddenPlacement::Unknown) =>
                {
                    piece.placement = Placement::Hidden(HiddenPlacement::Known { cell, salt });
                    false
                }
                _ => true,
            }
        });
    }

    fn recompute(&mut self) {
        let confirmed = project(&self.base, self.log.entries_in_order(), true);
        let latest = project(&self.base, self.log.entries_in_order(), false);

        let mut discrepancies = confirmed.discrepancies;
        for discrepancy in latest.discrepancies {
            if !discrepancies.contains(&discrepancy) {
                discrepancies.push(discrepancy);
            }
        }
        for discrepancy in &discrepancies {
            if !self.discrepancies.contains(discrepancy) {
                warn!(
                    target: "runtime::match",
                    match_id = %self.match_id,
                    sequence_number = discrepancy.sequence_number,
                    kind = ?discrepancy.kind,
                    "replay discrepancy"
                );
            }
        }

        self.confirmed = confirmed.state;
        self.latest = latest.state;
        self.discrepancies = discrepancies;
    }
}

/// Whether `kind` holds detail only the acting player knows.
fn carries_secret(kind: &ActionKind) -> bool {
    match kind {
        ActionKind::Summon(summon) => summon.salt.is_some(),
        ActionKind::Move(movement) => movement.salt.is_some(),
        ActionKind::Attack(_) | ActionKind::EndTurn(_) => false,
    }
}

/// Whether `public` is the ledger's account of the local action `local`.
fn is_public_half_of(public: &ActionKind, local: &ActionKind) -> bool {
    match (public, local) {
        (ActionKind::Summon(ours), ActionKind::Summon(theirs)) => {
            ours.salt.is_none()
                && ours.player == theirs.player
                && ours.piece_id == theirs.piece_id
                && ours.piece_type == theirs.piece_type
        }
        (ActionKind::Move(ours), ActionKind::Move(theirs)) => ours.salt.is_none() && ours.piece_id == theirs.piece_id,
        _ => false,
    }
}

/// Restores the viewer's own hidden positions a ledger snapshot does not carry.
///
/// Only pieces the snapshot knows nothing about are touched, and the first
/// source that knows the piece wins.
fn retain_own_secrets(state: &mut GameState, sources: &[&GameState], viewer: &PlayerId) {
    for piece in state.pieces.values_mut() {
        if piece.owner != *viewer || piece.placement != Placement::Hidden(HiddenPlacement::Unknown) {
            continue;
        }
        let known = sources.iter().find_map(|source| {
            source
                .piece(piece.id)
                .map(|held| held.placement)
                .filter(|placement| matches!(placement, Placement::Hidden(HiddenPlacement::Known { .. })))
        });
        if let Some(placement) = known {
            piece.placement = placement;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{
        ActionKind, Cell, DiscrepancyKind, EndTurnAction, ExecuteError, GameConfig, GameEngine, Piece, PieceId,
        PieceType, Seat, SummonAction,
    };

    const P1: PlayerId = PlayerId::repeat_byte(1);
    const P2: PlayerId = PlayerId::repeat_byte(2);
    const MATCH: MatchId = MatchId(7);

    fn snapshot(state: GameState) -> ConfirmedSnapshot {
        ConfirmedSnapshot { match_id: MATCH, state }
    }

    fn opening() -> GameState {
        GameState::opening(GameConfig::default(), P1, P1, P2)
    }

    fn end_turn(state: &GameState) -> GameState {
        let mut next = state.clone();
        let mover = next.mover_address().unwrap();
        let action = GameAction::confirmed(
            next.sequence_number + 1,
            ActionKind::EndTurn(EndTurnAction::new(mover, next.turn_number)),
        );
        GameEngine::new(&mut next).execute(&action).unwrap();
        next
    }

    fn skirmish() -> GameState {
        let mut state = opening();
        state.sequence_number = 6;
        state.player_mut(Seat::One).mana = 8;
        state.insert_piece(Piece::visible(PieceId(3), P1, PieceType::Cruiser, 3, Cell::new(2, 0)));
        state.insert_piece(Piece::visible(PieceId(4), P2, PieceType::Cruiser, 3, Cell::new(2, 3)));
        state
    }

    fn public_summon(piece_id: PieceId) -> ActionKind {
        ActionKind::Summon(SummonAction {
            player: P1,
            piece_id,
            piece_type: PieceType::Submarine,
            cell: None,
            salt: None,
        })
    }

    fn hidden_sub(cell: Cell, salt: Salt) -> Placement {
        Placement::Hidden(HiddenPlacement::Known { cell, salt })
    }

    #[test]
    fn newer_snapshot_advances() {
        let base = opening();
        let mut game = Match::new(snapshot(base.clone()));
        let event = game.on_confirmed_update(snapshot(end_turn(&base))).unwrap();
        assert!(matches!(event, Some(MatchEvent::StateAdvanced { .. })));
        assert_eq!(game.confirmed().sequence_number, 1);
        assert!(game.latest().is_turn_of(&P2));
    }

    #[test]
    fn equal_snapshot_is_a_no_op() {
        let base = opening();
        let mut game = Match::new(snapshot(base.clone()));
        assert_eq!(game.on_confirmed_update(snapshot(base)).unwrap(), None);
    }

    #[test]
    fn older_snapshot_rewinds_and_drops_predictions() {
        let base = skirmish();
        let mut game = Match::new(snapshot(base.clone()));
        game.on_local_intent(&Intent::Move {
            piece_id: PieceId(3),
            to: Cell::new(2, 2),
        }, Salt(1))
        .unwrap();
        assert_eq!(game.latest().sequence_number, 7);

        let mut earlier = base.clone();
        earlier.sequence_number = 5;
        let event = game.on_confirmed_update(snapshot(earlier)).unwrap();
        assert!(matches!(event, Some(MatchEvent::StateRewinded { .. })));
        assert!(game.actions().is_empty());
        assert_eq!(game.latest().sequence_number, 5);
        assert_eq!(game.latest().piece(PieceId(3)).unwrap().location(), Some(Cell::new(2, 0)));
    }

    #[test]
    fn illegal_intent_appends_nothing() {
        let mut game = Match::new(snapshot(opening()));
        let error = game
            .on_local_intent(&Intent::Summon {
                piece_type: PieceType::Warship,
                cell: Cell::new(2, 0),
            }, Salt(1))
            .unwrap_err();
        assert!(matches!(error, RuntimeError::Intent(_)));
        assert!(game.actions().is_empty());
    }

    #[test]
    fn failed_prediction_under_another_is_skipped_not_fatal() {
        let mut game = Match::new(snapshot(skirmish()));
        let moved = game
            .on_local_intent(&Intent::Move {
                piece_id: PieceId(3),
                to: Cell::new(2, 2),
            }, Salt(1))
            .unwrap();
        let attacked = game
            .on_local_intent(&Intent::Attack {
                attacker_id: PieceId(3),
                target_id: PieceId(4),
            }, Salt(2))
            .unwrap();
        assert_eq!(moved.action.sequence_number, 7);
        assert_eq!(attacked.action.sequence_number, 8);
        assert_eq!(game.latest().piece(PieceId(4)).unwrap().hp, 1);

        assert!(game.on_submission_failed(7).is_some());
        let order: Vec<_> = game.actions().iter().map(|entry| entry.sequence_number).collect();
        assert_eq!(order, vec![8]);
        assert_eq!(game.latest().sequence_number, 6);
        assert_eq!(game.latest().piece(PieceId(4)).unwrap().hp, 3);
        assert!(game.discrepancies().iter().any(|discrepancy| {
            discrepancy.sequence_number == 8
                && matches!(
                    discrepancy.kind,
                    DiscrepancyKind::Skipped(ExecuteError::SequenceGap { .. })
                )
        }));
    }

    #[test]
    fn rejected_summon_restores_mana_and_pieces() {
        let mut base = opening();
        base.player_mut(Seat::One).mana = 3;
        let mut game = Match::new(snapshot(base));
        let pieces_before = game.latest().pieces.len();

        let prediction = game
            .on_local_intent(&Intent::Summon {
                piece_type: PieceType::Cruiser,
                cell: Cell::new(2, 0),
            }, Salt(1))
            .unwrap();
        assert_eq!(game.latest().mana_of(Seat::One), 1);
        assert_eq!(game.latest().pieces.len(), pieces_before + 1);
        assert_eq!(game.confirmed().pieces.len(), pieces_before);

        game.on_submission_reverted(prediction.action.sequence_number).unwrap();
        assert_eq!(game.latest().mana_of(Seat::One), 3);
        assert_eq!(game.latest().pieces.len(), pieces_before);
    }

    #[test]
    fn conflicting_confirmation_faults_until_resync() {
        let base = opening();
        let mut game = Match::new(snapshot(base.clone()));
        let honest = LedgerEvent::new(MATCH, 1, ActionKind::EndTurn(EndTurnAction::new(P1, 1)));
        let forged = LedgerEvent::new(MATCH, 1, ActionKind::EndTurn(EndTurnAction::new(P2, 1)));

        assert!(game.on_ledger_event(honest.clone()).unwrap().is_some());
        assert_eq!(game.on_ledger_event(honest).unwrap(), None);
        assert!(matches!(
            game.on_ledger_event(forged),
            Err(RuntimeError::Consistency(ConsistencyFault::ConflictingConfirmed {
                sequence_number: 1
            }))
        ));
        assert!(matches!(
            game.on_local_intent(&Intent::EndTurn, Salt(1)),
            Err(RuntimeError::Faulted)
        ));

        let event = game.resync(snapshot(end_turn(&base))).unwrap();
        assert!(matches!(event, MatchEvent::Resynced { .. }));
        assert!(!game.is_faulted());
        assert!(game.actions().is_empty());
        assert_eq!(game.confirmed().sequence_number, 1);
    }

    #[test]
    fn notification_gap_asks_for_refresh() {
        let mut game = Match::new(snapshot(opening()));
        let early = LedgerEvent::new(MATCH, 3, ActionKind::EndTurn(EndTurnAction::new(P1, 2)));
        assert_eq!(game.on_ledger_event(early).unwrap(), None);
        assert!(game.needs_refresh());
        assert!(game.actions().is_empty());
    }

    #[test]
    fn snapshot_of_another_match_faults() {
        let mut game = Match::new(snapshot(opening()));
        let foreign = ConfirmedSnapshot {
            match_id: MatchId(99),
            state: opening(),
        };
        assert!(matches!(
            game.on_confirmed_update(foreign),
            Err(RuntimeError::Consistency(ConsistencyFault::ForeignSnapshot { .. }))
        ));
        assert!(game.is_faulted());
    }

    #[test]
    fn own_hidden_position_survives_a_public_snapshot() {
        let mut base = opening();
        base.player_mut(Seat::One).mana = 8;
        let mut game = Match::new(snapshot(base.clone()));
        let prediction = game
            .on_local_intent(&Intent::Summon {
                piece_type: PieceType::Submarine,
                cell: Cell::new(2, 0),
            }, Salt(42))
            .unwrap();
        assert!(prediction.witness.is_some());

        // The ledger only knows a submarine exists.
        let mut public = base.clone();
        let mut summon = prediction.action.kind.clone();
        if let ActionKind::Summon(action) = &mut summon {
            action.cell = None;
            action.salt = None;
        }
        GameEngine::new(&mut public)
            .execute(&GameAction::confirmed(1, summon))
            .unwrap();
        let sub = public.piece(PieceId(3)).unwrap();
        assert_eq!(sub.placement, Placement::Hidden(HiddenPlacement::Unknown));

        game.on_confirmed_update(snapshot(public)).unwrap();
        assert_eq!(
            game.confirmed().piece(PieceId(3)).unwrap().placement,
            Placement::Hidden(HiddenPlacement::Known {
                cell: Cell::new(2, 0),
                salt: Salt(42)
            })
        );
        assert!(game.actions().is_empty());
    }

    #[test]
    fn state_events_carry_the_predicted_snapshot() {
        let mut game = Match::new(snapshot(skirmish()));
        let moved = game
            .on_local_intent(&Intent::Move {
                piece_id: PieceId(3),
                to: Cell::new(2, 2),
            }, Salt(1))
            .unwrap();
        game.on_local_intent(&Intent::Attack {
            attacker_id: PieceId(3),
            target_id: PieceId(4),
        }, Salt(2))
        .unwrap();

        let event = game
            .on_ledger_event(LedgerEvent::new(MATCH, 7, moved.action.kind))
            .unwrap()
            .unwrap();
        assert!(matches!(event, MatchEvent::StateAdvanced { .. }));
        assert_eq!(event.state(), Some(game.latest()));
        assert_eq!(event.state().unwrap().piece(PieceId(4)).unwrap().hp, 1);
        assert_eq!(game.confirmed().piece(PieceId(4)).unwrap().hp, 3);
    }

    #[test]
    fn relabel_moves_prediction_to_an_empty_slot() {
        let mut game = Match::new(snapshot(skirmish()));
        let moved = game
            .on_local_intent(&Intent::Move {
                piece_id: PieceId(3),
                to: Cell::new(2, 2),
            }, Salt(1))
            .unwrap();

        game.on_submission_confirmed(7, 8);
        assert!(game.log().get(7).is_none());
        let relabeled = game.log().get(8).unwrap();
        assert!(relabeled.from_local_data);
        assert_eq!(relabeled.kind, moved.action.kind);

        game.on_submission_confirmed(8, 8);
        assert_eq!(game.actions().len(), 1);
    }

    #[test]
    fn relabel_onto_a_pending_prediction_drops_the_relabeled_one() {
        let mut game = Match::new(snapshot(skirmish()));
        game.on_local_intent(&Intent::Move {
            piece_id: PieceId(3),
            to: Cell::new(2, 2),
        }, Salt(1))
        .unwrap();
        let attacked = game
            .on_local_intent(&Intent::Attack {
                attacker_id: PieceId(3),
                target_id: PieceId(4),
            }, Salt(2))
            .unwrap();

        game.on_submission_confirmed(7, 8);
        let actions = game.actions();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0], attacked.action);
    }

    #[test]
    fn relabel_onto_its_confirmation_keeps_the_hidden_position() {
        let mut game = Match::new(snapshot(skirmish()));
        game.on_local_intent(&Intent::Move {
            piece_id: PieceId(3),
            to: Cell::new(2, 2),
        }, Salt(1))
        .unwrap();
        let summoned = game
            .on_local_intent(&Intent::Summon {
                piece_type: PieceType::Submarine,
                cell: Cell::new(4, 0),
            }, Salt(42))
            .unwrap();
        assert_eq!(summoned.action.sequence_number, 8);
        assert_eq!(summoned.action.kind.pieces(), vec![PieceId(5)]);

        // The move never landed; the summon took its slot on the ledger.
        game.on_ledger_event(LedgerEvent::new(MATCH, 7, public_summon(PieceId(5))))
            .unwrap();
        assert_eq!(
            game.confirmed().piece(PieceId(5)).unwrap().placement,
            Placement::Hidden(HiddenPlacement::Unknown)
        );

        game.on_submission_confirmed(8, 7);
        assert_eq!(
            game.confirmed().piece(PieceId(5)).unwrap().placement,
            hidden_sub(Cell::new(4, 0), Salt(42))
        );
        assert_eq!(game.actions().len(), 1);
        assert!(game.actions()[0].is_confirmed());
    }

    #[test]
    fn rewound_hidden_summon_keeps_its_position_when_it_lands() {
        let base = skirmish();
        let mut game = Match::new(snapshot(base.clone()));
        game.on_local_intent(&Intent::Summon {
            piece_type: PieceType::Submarine,
            cell: Cell::new(4, 0),
        }, Salt(42))
        .unwrap();

        let mut earlier = base;
        earlier.sequence_number = 5;
        game.on_confirmed_update(snapshot(earlier)).unwrap();
        assert!(game.actions().is_empty());
        assert!(game.latest().piece(PieceId(5)).is_none());

        game.on_ledger_event(LedgerEvent::new(MATCH, 6, public_summon(PieceId(5))))
            .unwrap();
        assert_eq!(
            game.confirmed().piece(PieceId(5)).unwrap().placement,
            hidden_sub(Cell::new(4, 0), Salt(42))
        );
    }

    #[test]
    fn rewound_hidden_summon_is_restored_from_a_later_snapshot() {
        let base = skirmish();
        let mut game = Match::new(snapshot(base.clone()));
        game.on_local_intent(&Intent::Summon {
            piece_type: PieceType::Submarine,
            cell: Cell::new(4, 0),
        }, Salt(42))
        .unwrap();

        let mut earlier = base;
        earlier.sequence_number = 5;
        game.on_confirmed_update(snapshot(earlier.clone())).unwrap();

        let mut public = earlier;
        GameEngine::new(&mut public)
            .execute(&GameAction::confirmed(6, public_summon(PieceId(5))))
            .unwrap();
        game.on_confirmed_update(snapshot(public)).unwrap();
        assert_eq!(
            game.confirmed().piece(PieceId(5)).unwrap().placement,
            hidden_sub(Cell::new(4, 0), Salt(42))
        );
    }

    #[test]
    fn reverted_rewound_summon_is_forgotten() {
        let base = skirmish();
        let mut game = Match::new(snapshot(base.clone()));
        game.on_local_intent(&Intent::Summon {
            piece_type: PieceType::Submarine,
            cell: Cell::new(4, 0),
        }, Salt(42))
        .unwrap();

        let mut earlier = base;
        earlier.sequence_number = 5;
        game.on_confirmed_update(snapshot(earlier)).unwrap();
        assert_eq!(game.on_submission_reverted(7), None);

        game.on_ledger_event(LedgerEvent::new(MATCH, 6, public_summon(PieceId(5))))
            .unwrap();
        assert_eq!(
            game.confirmed().piece(PieceId(5)).unwrap().placement,
            Placement::Hidden(HiddenPlacement::Unknown)
        );
    }
}
