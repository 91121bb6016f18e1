//! Hot-seat prompt driving both players of a local match.
//!
//! Each seat owns its own runtime and therefore its own view of the match:
//! the prompt always acts through the runtime of the seat that is to move,
//! and `board` shows only what that seat knows. The helm changes hands only
//! once the ledger has confirmed the turn change.
use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use game_core::{GameAction, GameState, PlayerId, SequenceNumber, Seat};
use runtime::{MatchEvent, MatchHandle, Topic};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::command::{ClientCommand, HELP};
use crate::render::{render_board, render_history};

/// How long `end` waits for the ledger before giving the prompt back.
const HANDOVER_TIMEOUT: Duration = Duration::from_secs(30);

enum Flow {
    Continue,
    Quit,
}

pub struct App {
    players: [PlayerId; 2],
    handles: [MatchHandle; 2],
    seat: Seat,
}

impl App {
    pub fn new(players: [PlayerId; 2], handles: [MatchHandle; 2]) -> Self {
        Self {
            players,
            handles,
            seat: Seat::One,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let printers: Vec<JoinHandle<()>> = [Seat::One, Seat::Two]
            .into_iter()
            .map(|seat| spawn_event_printer(seat, &self.handles[seat.index()]))
            .collect();

        println!("{HELP}\n");
        self.show_board().await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if let Err(error) = self.sync_seat().await {
                tracing::warn!(seat = %self.seat, "seat sync failed: {error:#}");
            }
            print!("{}> ", self.seat);
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<ClientCommand>() {
                Ok(command) => command,
                Err(error) => {
                    println!("{error:#}");
                    continue;
                }
            };

            match self.dispatch(command).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(error) => {
                    tracing::warn!(seat = %self.seat, "command failed: {error:#}");
                    println!("error: {error:#}");
                }
            }
        }

        for printer in printers {
            printer.abort();
        }
        Ok(())
    }

    fn handle(&self) -> &MatchHandle {
        &self.handles[self.seat.index()]
    }

    async fn dispatch(&mut self, command: ClientCommand) -> Result<Flow> {
        match command {
            ClientCommand::Summon { piece_type, cell } => {
                let action = self.handle().summon(piece_type, cell).await?;
                report_prediction(&action);
            }
            ClientCommand::Move { piece_id, to } => {
                let action = self.handle().move_piece(piece_id, to).await?;
                report_prediction(&action);
            }
            ClientCommand::Attack { attacker_id, target_id } => {
                let action = self.handle().attack(attacker_id, target_id).await?;
                report_prediction(&action);
            }
            ClientCommand::EndTurn => {
                // Subscribe first so a fast confirmation is not missed.
                let mut states = self.handle().subscribe(Topic::State);
                let mut actions = self.handle().subscribe(Topic::Action);
                let action = self.handle().end_turn().await?;
                report_prediction(&action);
                self.await_handover(action.sequence_number, &mut states, &mut actions)
                    .await?;
            }
            ClientCommand::Board => self.show_board().await?,
            ClientCommand::Log => {
                let actions = self.handle().actions().await?;
                let discrepancies = self.handle().discrepancies().await?;
                print!("{}", render_history(&actions, &discrepancies));
            }
            ClientCommand::Refresh => {
                self.handle().refresh().await?;
                println!("refreshed from the ledger");
            }
            ClientCommand::Help => println!("{HELP}"),
            ClientCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Hands the prompt to whichever seat the confirmed state says is to move.
    async fn sync_seat(&mut self) -> Result<bool> {
        let confirmed = self.handle().confirmed_state().await?;
        let next = seat_to_act(self.seat, &confirmed);
        if next == self.seat {
            return Ok(false);
        }
        self.seat = next;
        println!("{} ({}) takes the helm", self.seat, self.players[self.seat.index()]);
        Ok(true)
    }

    /// Waits until the end-turn at `sequence_number` is confirmed or rolled back.
    async fn await_handover(
        &mut self,
        sequence_number: SequenceNumber,
        states: &mut Receiver<MatchEvent>,
        actions: &mut Receiver<MatchEvent>,
    ) -> Result<()> {
        let deadline = tokio::time::sleep(HANDOVER_TIMEOUT);
        tokio::pin!(deadline);

        loop {
            if self.sync_seat().await? {
                return Ok(());
            }
            tokio::select! {
                event = states.recv() => {
                    if let Err(RecvError::Closed) = event {
                        return Ok(());
                    }
                }
                event = actions.recv() => match event {
                    Ok(MatchEvent::ActionRolledBack { action, .. })
                        if action.sequence_number == sequence_number =>
                    {
                        println!("turn stays with {}", self.seat);
                        return Ok(());
                    }
                    Err(RecvError::Closed) => return Ok(()),
                    _ => {}
                },
                _ = &mut deadline => {
                    println!("end of turn not confirmed yet; the helm passes once it is");
                    return Ok(());
                }
            }
        }
    }

    async fn show_board(&self) -> Result<()> {
        let state = self.handle().latest_state().await?;
        print!("{}", render_board(&state));
        Ok(())
    }
}

/// Seat that should hold the prompt given the confirmed state; `current`
/// keeps it while nobody is to move.
fn seat_to_act(current: Seat, confirmed: &GameState) -> Seat {
    confirmed.mover().unwrap_or(current)
}

fn report_prediction(action: &GameAction) {
    println!("predicted #{} {}", action.sequence_number, action.kind.as_str());
}

/// Prints rollbacks and faults of one seat as they happen.
fn spawn_event_printer(seat: Seat, handle: &MatchHandle) -> JoinHandle<()> {
    let mut actions = handle.subscribe(Topic::Action);
    let mut faults = handle.subscribe(Topic::Fault);

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                event = actions.recv() => event,
                event = faults.recv() => event,
            };

            match event {
                Ok(MatchEvent::ActionRolledBack { action, cause, .. }) => {
                    println!(
                        "\n[{seat}] #{} {} rolled back: {}",
                        action.sequence_number,
                        action.kind.as_str(),
                        cause.reason()
                    );
                }
                Ok(MatchEvent::ConsistencyFault { sequence_number, detail }) => {
                    println!("\n[{seat}] history fault at #{sequence_number}: {detail}");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%seat, skipped, "event printer lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
