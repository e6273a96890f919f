//! The line-oriented wire protocol shared with peer bots.
//!
//! One message per line, clauses separated by spaces, terminated by a
//! newline:
//!
//! - `T#.###` the sender's remaining game clock
//! - `P#` the player's seat index
//! - `H**,**` the player's hole cards in the common format
//! - `G*` the player's secret bounty rank
//! - `F` / `C` / `K` a fold/call/check action in the round history
//! - `R###` a raise action in the round history
//! - `B**,...` newly revealed community cards
//! - `O**,**` the opponent's hole cards, shown at showdown only
//! - `D###` the player's bankroll delta from the round
//! - `Y##` bounty-hit flags for (self, opponent); `#` means masked
//! - `Q` match over
//!
//! Action history is sent exactly once, incrementally, including the
//! player's own actions. A response is a single token whose first
//! character selects the action; `R` is followed by the raise-to
//! amount with no separator.

use std::fmt;

use crate::game::entities::{
    Action, ActionKind, Card, Chips, LegalActions, Value, value_char,
};

use super::errors::ProtocolError;

/// A single clause of an engine-to-peer message.
#[derive(Clone, Debug, PartialEq)]
pub enum Clause {
    Clock(f64),
    Seat(usize),
    Hole([Card; 2]),
    Bounty(Value),
    History(Action),
    Board(Vec<Card>),
    Reveal([Card; 2]),
    Delta(i64),
    BountyHits {
        own: Option<bool>,
        opponent: Option<bool>,
    },
    Quit,
}

fn cards_csv(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn hit_char(hit: Option<bool>) -> char {
    match hit {
        Some(true) => '1',
        Some(false) => '0',
        None => '#',
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Clock(clock) => write!(f, "T{clock:.3}"),
            Self::Seat(seat) => write!(f, "P{seat}"),
            Self::Hole(cards) => write!(f, "H{}", cards_csv(cards)),
            Self::Bounty(rank) => write!(f, "G{}", value_char(*rank)),
            Self::History(Action::Fold) => write!(f, "F"),
            Self::History(Action::Call) => write!(f, "C"),
            Self::History(Action::Check) => write!(f, "K"),
            Self::History(Action::Raise(amount)) => write!(f, "R{amount}"),
            Self::Board(cards) => write!(f, "B{}", cards_csv(cards)),
            Self::Reveal(cards) => write!(f, "O{}", cards_csv(cards)),
            Self::Delta(delta) => write!(f, "D{delta}"),
            Self::BountyHits { own, opponent } => {
                write!(f, "Y{}{}", hit_char(*own), hit_char(*opponent))
            }
            Self::Quit => write!(f, "Q"),
        }
    }
}

/// Decodes a single-token peer response into an action, validating it
/// against the current legal set and, for raises, the queried bounds.
pub fn decode_action(
    line: &str,
    legal: LegalActions,
    bounds: Option<(Chips, Chips)>,
) -> Result<Action, ProtocolError> {
    let line = line.trim();
    let mut chars = line.chars();
    let kind = match chars.next() {
        Some('F') => ActionKind::Fold,
        Some('C') => ActionKind::Call,
        Some('K') => ActionKind::Check,
        Some('R') => ActionKind::Raise,
        _ => return Err(ProtocolError::Malformed(line.to_string())),
    };
    if !legal.contains(kind) {
        return Err(ProtocolError::IllegalAction(kind));
    }
    match kind {
        ActionKind::Fold => Ok(Action::Fold),
        ActionKind::Call => Ok(Action::Call),
        ActionKind::Check => Ok(Action::Check),
        ActionKind::Raise => {
            let amount: Chips = chars
                .as_str()
                .parse()
                .map_err(|_| ProtocolError::Malformed(line.to_string()))?;
            let (min, max) =
                bounds.ok_or_else(|| ProtocolError::IllegalAction(ActionKind::Raise))?;
            if amount < min || amount > max {
                return Err(ProtocolError::RaiseOutOfBounds { amount, min, max });
            }
            Ok(Action::Raise(amount))
        }
    }
}
