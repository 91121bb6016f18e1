//! Sequence-numbered history of a match.
//!
//! [`ActionLog`] holds at most one entry per sequence number. Confirmed
//! entries only ever gain the owner's private detail once inserted; a prediction is replaced by the
//! confirmed entry for its slot, or removed when its submission fails.
use std::collections::BTreeMap;

use game_core::{GameAction, SequenceNumber};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionLogError {
    #[error("sequence {sequence_number} already holds a different confirmed action")]
    ConfirmedConflict {
        sequence_number: SequenceNumber,
        existing: Box<GameAction>,
        incoming: Box<GameAction>,
    },

    #[error("sequence {0} already holds a pending prediction")]
    SlotOccupied(SequenceNumber),

    #[error("no entry at sequence {0}")]
    NotFound(SequenceNumber),

    #[error("entry {0} is confirmed and cannot be rolled back")]
    AlreadyConfirmed(SequenceNumber),
}

/// How [`ActionLog::add_action`] placed an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    /// The slot was empty.
    Inserted,
    /// A confirmed entry took over the prediction it returns.
    Resolved(GameAction),
    /// The same confirmed entry was already there.
    Duplicate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionLog {
    entries: BTreeMap<SequenceNumber, GameAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `action` at its sequence number.
    pub fn add_action(&mut self, mut action: GameAction) -> Result<Insertion, ActionLogError> {
        let sequence_number = action.sequence_number;
        let Some(existing) = self.entries.get(&sequence_number) else {
            self.entries.insert(sequence_number, action);
            return Ok(Insertion::Inserted);
        };

        match (existing.is_confirmed(), action.is_confirmed()) {
            (_, false) => Err(ActionLogError::SlotOccupied(sequence_number)),
            (false, true) => {
                action.absorb_local_detail(existing);
                let predicted = self.entries.insert(sequence_number, action);
                Ok(predicted.map_or(Insertion::Inserted, Insertion::Resolved))
            }
            (true, true) => {
                // Re-deliveries lack private detail the stored entry absorbed.
                let mut candidate = action.clone();
                candidate.absorb_local_detail(existing);
                if &candidate == existing {
                    Ok(Insertion::Duplicate)
                } else {
                    Err(ActionLogError::ConfirmedConflict {
                        sequence_number,
                        existing: Box::new(existing.clone()),
                        incoming: Box::new(action),
                    })
                }
            }
        }
    }

    /// Removes the prediction at `sequence_number` and hands it back.
    pub fn mark_failed(&mut self, sequence_number: SequenceNumber) -> Result<GameAction, ActionLogError> {
        match self.entries.get(&sequence_number) {
            None => Err(ActionLogError::NotFound(sequence_number)),
            Some(entry) if entry.is_confirmed() => Err(ActionLogError::AlreadyConfirmed(sequence_number)),
            Some(_) => self
                .entries
                .remove(&sequence_number)
                .ok_or(ActionLogError::NotFound(sequence_number)),
        }
    }

    /// Every entry, confirmed and pending, by ascending sequence number.
    pub fn entries_in_order(&self) -> impl Iterator<Item = &GameAction> + '_ {
        self.entries.values()
    }

    /// Copies the private detail of `local` into the confirmed entry at its
    /// sequence number. Returns false when that slot holds no confirmed entry.
    pub fn enrich_confirmed(&mut self, local: &GameAction) -> bool {
        match self.entries.get_mut(&local.sequence_number) {
            Some(entry) if entry.is_confirmed() => {
                entry.absorb_local_detail(local);
                true
            }
            _ => false,
        }
    }

    /// Predictions still waiting for the ledger.
    pub fn pending(&self) -> impl Iterator<Item = &GameAction> + '_ {
        self.entries.values().filter(|entry| entry.from_local_data)
    }

    pub fn get(&self, sequence_number: SequenceNumber) -> Option<&GameAction> {
        self.entries.get(&sequence_number)
    }

    /// Drops every entry a confirmed snapshot at `sequence_number` already contains.
    pub fn prune_through(&mut self, sequence_number: SequenceNumber) -> Vec<GameAction> {
        let kept = self.entries.split_off(&(sequence_number + 1));
        let pruned = std::mem::replace(&mut self.entries, kept);
        pruned.into_values().collect()
    }

    /// Reshapes the log after the ledger went back to `sequence_number`.
    ///
    /// Entries up to `sequence_number` are part of the new base. Above it only
    /// confirmed entries that continue the new base without a hole survive;
    /// every prediction is dropped. Returns the dropped predictions.
    pub fn retain_after_rewind(&mut self, sequence_number: SequenceNumber) -> Vec<GameAction> {
        self.prune_through(sequence_number);

        let mut expected = sequence_number + 1;
        let mut dropped = Vec::new();
        let entries = std::mem::take(&mut self.entries);
        for (seq, entry) in entries {
            if entry.is_confirmed() && seq == expected {
                expected += 1;
                self.entries.insert(seq, entry);
            } else if entry.from_local_data {
                dropped.push(entry);
            }
        }
        dropped
    }

    pub fn last_sequence_number(&self) -> Option<SequenceNumber> {
        self.entries.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use game_core::{ActionKind, Cell, EndTurnAction, MoveAction, PieceId, PlayerId, Salt};

    const P1: PlayerId = PlayerId::repeat_byte(1);

    fn end_turn(turn: u32) -> ActionKind {
        ActionKind::EndTurn(EndTurnAction::new(P1, turn))
    }

    fn hidden_move(path: Vec<Cell>) -> ActionKind {
        let action = MoveAction::new(PieceId(4), path);
        if action.path.is_empty() {
            ActionKind::Move(action)
        } else {
            ActionKind::Move(action.with_salt(Salt(9)))
        }
    }

    #[test]
    fn entries_come_out_by_sequence_number() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::predicted(3, end_turn(3))).unwrap();
        log.add_action(GameAction::confirmed(1, end_turn(1))).unwrap();
        log.add_action(GameAction::confirmed(2, end_turn(2))).unwrap();

        let order: Vec<_> = log.entries_in_order().map(|entry| entry.sequence_number).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(log.pending().count(), 1);
        assert_eq!(log.last_sequence_number(), Some(3));
    }

    #[test]
    fn confirmed_entry_resolves_prediction_and_keeps_private_detail() {
        let mut log = ActionLog::new();
        let local = GameAction::predicted(5, hidden_move(vec![Cell::new(1, 1)]));
        log.add_action(local.clone()).unwrap();
        log.add_action(GameAction::predicted(6, end_turn(2))).unwrap();

        let insertion = log.add_action(GameAction::confirmed(5, hidden_move(vec![]))).unwrap();
        assert_eq!(insertion, Insertion::Resolved(local));

        let resolved = log.get(5).unwrap();
        assert!(resolved.is_confirmed());
        assert_eq!(resolved.kind, hidden_move(vec![Cell::new(1, 1)]));
        assert!(log.get(6).unwrap().from_local_data);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn enrich_confirmed_fills_only_confirmed_slots() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::confirmed(5, hidden_move(vec![]))).unwrap();
        log.add_action(GameAction::predicted(6, end_turn(2))).unwrap();

        assert!(log.enrich_confirmed(&GameAction::predicted(5, hidden_move(vec![Cell::new(2, 2)]))));
        assert_eq!(log.get(5).unwrap().kind, hidden_move(vec![Cell::new(2, 2)]));
        assert!(log.get(5).unwrap().is_confirmed());

        assert!(!log.enrich_confirmed(&GameAction::predicted(6, end_turn(2))));
        assert!(!log.enrich_confirmed(&GameAction::predicted(9, end_turn(2))));
    }

    #[test]
    fn second_prediction_on_a_slot_is_refused() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::predicted(2, end_turn(1))).unwrap();
        assert_eq!(
            log.add_action(GameAction::predicted(2, end_turn(1))),
            Err(ActionLogError::SlotOccupied(2))
        );
    }

    #[test]
    fn redelivered_confirmation_is_idempotent() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::predicted(5, hidden_move(vec![Cell::new(1, 1)])))
            .unwrap();
        log.add_action(GameAction::confirmed(5, hidden_move(vec![]))).unwrap();
        let before = log.clone();

        assert_eq!(
            log.add_action(GameAction::confirmed(5, hidden_move(vec![]))),
            Ok(Insertion::Duplicate)
        );
        assert_eq!(log, before);
    }

    #[test]
    fn conflicting_confirmations_are_reported() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::confirmed(4, end_turn(2))).unwrap();
        let error = log.add_action(GameAction::confirmed(4, end_turn(3))).unwrap_err();
        assert!(matches!(
            error,
            ActionLogError::ConfirmedConflict { sequence_number: 4, .. }
        ));
        assert_eq!(log.get(4).unwrap().kind, end_turn(2));
    }

    #[test]
    fn mark_failed_only_removes_predictions() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::confirmed(6, end_turn(1))).unwrap();
        log.add_action(GameAction::predicted(7, end_turn(2))).unwrap();
        log.add_action(GameAction::predicted(8, end_turn(3))).unwrap();

        assert_eq!(log.mark_failed(7).unwrap().sequence_number, 7);
        assert_eq!(log.mark_failed(6), Err(ActionLogError::AlreadyConfirmed(6)));
        assert_eq!(log.mark_failed(9), Err(ActionLogError::NotFound(9)));

        let order: Vec<_> = log.entries_in_order().map(|entry| entry.sequence_number).collect();
        assert_eq!(order, vec![6, 8]);
    }

    #[test]
    fn prune_through_drops_the_covered_prefix() {
        let mut log = ActionLog::new();
        for seq in 1..=4 {
            log.add_action(GameAction::confirmed(seq, end_turn(seq as u32))).unwrap();
        }
        let pruned = log.prune_through(2);
        assert_eq!(pruned.len(), 2);
        assert_eq!(log.entries_in_order().next().unwrap().sequence_number, 3);
    }

    #[test]
    fn rewind_keeps_only_contiguous_confirmed_entries() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::confirmed(4, end_turn(4))).unwrap();
        log.add_action(GameAction::confirmed(5, end_turn(5))).unwrap();
        log.add_action(GameAction::predicted(6, end_turn(6))).unwrap();
        log.add_action(GameAction::confirmed(8, end_turn(8))).unwrap();

        let dropped = log.retain_after_rewind(3);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].sequence_number, 6);
        let order: Vec<_> = log.entries_in_order().map(|entry| entry.sequence_number).collect();
        assert_eq!(order, vec![4, 5]);
    }

    #[test]
    fn rewind_below_predictions_drops_them_all() {
        let mut log = ActionLog::new();
        log.add_action(GameAction::predicted(5, end_turn(1))).unwrap();
        log.add_action(GameAction::predicted(6, end_turn(2))).unwrap();
        let dropped = log.retain_after_rewind(4);
        assert_eq!(dropped.len(), 2);
        assert!(log.is_empty());
    }
}
