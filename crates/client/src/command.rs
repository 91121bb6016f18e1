//! Prompt commands understood by the local client.
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use game_core::{Cell, PieceId, PieceType};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientCommand {
    Summon { piece_type: PieceType, cell: Cell },
    Move { piece_id: PieceId, to: Cell },
    Attack { attacker_id: PieceId, target_id: PieceId },
    EndTurn,
    Board,
    Log,
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  summon <type> <row> <col>   summon a unit next to your mothership
  move <id> <row> <col>       move a piece along the shortest open path
  attack <id> <target>        attack a piece in range
  end                         end your turn
  board                       show the board as the current player sees it
  log                         show the action history and discrepancies
  refresh                     fetch the confirmed state from the ledger
  help                        show this message
  quit                        leave the match";

impl FromStr for ClientCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            bail!("empty command");
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
            ("summon" | "s", [kind, row, col]) => ClientCommand::Summon {
                piece_type: kind
                    .parse()
                    .map_err(|_| anyhow!("unknown unit type '{kind}'"))?,
                cell: parse_cell(row, col)?,
            },
            ("move" | "m", [id, row, col]) => ClientCommand::Move {
                piece_id: parse_piece(id)?,
                to: parse_cell(row, col)?,
            },
            ("attack" | "a", [attacker, target]) => ClientCommand::Attack {
                attacker_id: parse_piece(attacker)?,
                target_id: parse_piece(target)?,
            },
            ("end" | "e", []) => ClientCommand::EndTurn,
            ("board" | "b", []) => ClientCommand::Board,
            ("log" | "l", []) => ClientCommand::Log,
            ("refresh" | "r", []) => ClientCommand::Refresh,
            ("help" | "h" | "?", []) => ClientCommand::Help,
            ("quit" | "q" | "exit", []) => ClientCommand::Quit,
            (verb, _) => bail!("cannot parse '{verb}' with {} argument(s); try 'help'", args.len()),
        };
        Ok(command)
    }
}

fn parse_cell(row: &str, col: &str) -> Result<Cell> {
    let row = row.parse().with_context(|| format!("invalid row '{row}'"))?;
    let col = col.parse().with_context(|| format!("invalid column '{col}'"))?;
    Ok(Cell::new(row, col))
}

fn parse_piece(raw: &str) -> Result<PieceId> {
    let digits = raw.trim_start_matches('#');
    let id = digits.parse().with_context(|| format!("invalid piece id '{raw}'"))?;
    Ok(PieceId(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_game_commands() {
        assert_eq!(
            "summon cruiser 2 1".parse::<ClientCommand>().unwrap(),
            ClientCommand::Summon {
                piece_type: PieceType::Cruiser,
                cell: Cell::new(2, 1),
            }
        );
        assert_eq!(
            "move #3 4 2".parse::<ClientCommand>().unwrap(),
            ClientCommand::Move {
                piece_id: PieceId(3),
                to: Cell::new(4, 2),
            }
        );
        assert_eq!(
            "a 3 2".parse::<ClientCommand>().unwrap(),
            ClientCommand::Attack {
                attacker_id: PieceId(3),
                target_id: PieceId(2),
            }
        );
        assert_eq!("END".parse::<ClientCommand>().unwrap(), ClientCommand::EndTurn);
    }

    #[test]
    fn unit_types_ignore_case() {
        let command = "summon Submarine 3 1".parse::<ClientCommand>().unwrap();
        assert!(matches!(
            command,
            ClientCommand::Summon {
                piece_type: PieceType::Submarine,
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("".parse::<ClientCommand>().is_err());
        assert!("summon dragon 1 1".parse::<ClientCommand>().is_err());
        assert!("move 3 x 2".parse::<ClientCommand>().is_err());
        assert!("end now".parse::<ClientCommand>().is_err());
        assert!("fly 1 2".parse::<ClientCommand>().is_err());
    }
}
