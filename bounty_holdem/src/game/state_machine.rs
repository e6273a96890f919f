//! The round state machine.
//!
//! One [`Round`] encodes the betting tree for a single hand. Betting
//! states live in an arena and refer to their parent by index, so the
//! full history chain can be walked for logging without ownership
//! cycles. [`Round::proceed`] is the only way states are created: given
//! a state and an action it either pushes the successor state or
//! produces the round's single [`TerminalState`].

use thiserror::Error;

use super::entities::{
    Action, ActionKind, Card, Chips, Deck, GameSettings, LegalActions, Value,
};
use super::functional;

/// Arena index of a betting state within its [`Round`].
pub type StateId = usize;

/// Errors that indicate a transition-function bug. Any of these aborts
/// the match; none is ever recovered into a forced default.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("showdown reached with unequal stacks ({0} vs {1})")]
    ShowdownStacksUnequal(Chips, Chips),
    #[error("round settled with non-zero-sum deltas ({0}, {1})")]
    NonZeroSumDeltas(i64, i64),
    #[error("raise to {amount} outside bounds [{min}, {max}] reached the transition function")]
    RaiseOutOfBounds { amount: Chips, min: Chips, max: Chips },
}

/// One betting decision point. `button % 2` selects the active player;
/// the button also encodes how many of the street's actions have
/// settled (button 0 is reserved for the pre-flop blind-completion
/// step).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundState {
    pub button: u32,
    /// Betting phase: 0 pre-flop, 3 flop, 4 turn, 5 river.
    pub street: u8,
    /// Chips contributed to the pot during the current street.
    pub pips: [Chips; 2],
    pub stacks: [Chips; 2],
    pub previous: Option<StateId>,
}

impl RoundState {
    #[must_use]
    pub const fn active(&self) -> usize {
        (self.button % 2) as usize
    }

    const fn continue_cost(&self) -> Chips {
        let active = self.active();
        self.pips[1 - active] - self.pips[active]
    }
}

/// The settled outcome of one round. `deltas` always sum to zero.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TerminalState {
    pub deltas: [i64; 2],
    pub bounty_hits: [bool; 2],
    pub previous: StateId,
}

/// Result of advancing the game tree by one action.
#[derive(Clone, Debug)]
pub enum Transition {
    Continue(StateId),
    Terminal(TerminalState),
}

/// Pot winner for delta computation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Winner {
    P0,
    P1,
    Split,
}

/// The game tree for one round of poker.
#[derive(Debug)]
pub struct Round {
    settings: GameSettings,
    deck: Deck,
    hands: [[Card; 2]; 2],
    bounties: [Value; 2],
    states: Vec<RoundState>,
}

impl Round {
    /// Arena index of the initial deal state.
    pub const ROOT: StateId = 0;

    /// Deals both hole hands from an already-shuffled deck and posts
    /// the blinds, seeding the initial state.
    #[must_use]
    pub fn new(settings: GameSettings, mut deck: Deck, bounties: [Value; 2]) -> Self {
        let holes0 = deck.deal(2);
        let holes1 = deck.deal(2);
        let hands = [[holes0[0], holes0[1]], [holes1[0], holes1[1]]];
        let root = RoundState {
            button: 0,
            street: 0,
            pips: [settings.small_blind, settings.big_blind],
            stacks: [
                settings.starting_stack - settings.small_blind,
                settings.starting_stack - settings.big_blind,
            ],
            previous: None,
        };
        Self {
            settings,
            deck,
            hands,
            bounties,
            states: vec![root],
        }
    }

    #[must_use]
    pub fn state(&self, id: StateId) -> &RoundState {
        &self.states[id]
    }

    #[must_use]
    pub fn hands(&self) -> &[[Card; 2]; 2] {
        &self.hands
    }

    #[must_use]
    pub fn bounties(&self) -> [Value; 2] {
        self.bounties
    }

    /// Community cards revealed so far on the given street.
    #[must_use]
    pub fn board(&self, street: u8) -> &[Card] {
        self.deck.peek(street as usize)
    }

    /// The set of moves legal for the active player.
    #[must_use]
    pub fn legal_actions(&self, id: StateId) -> LegalActions {
        let state = &self.states[id];
        let active = state.active();
        let continue_cost = state.continue_cost();
        if continue_cost == 0 {
            // Betting is only possible while both players can afford it.
            let bets_forbidden = state.stacks[0] == 0 || state.stacks[1] == 0;
            return if bets_forbidden {
                LegalActions::new(&[ActionKind::Check])
            } else {
                LegalActions::new(&[ActionKind::Check, ActionKind::Raise])
            };
        }
        // Likewise, re-raising requires room on both sides.
        let raises_forbidden =
            continue_cost == state.stacks[active] || state.stacks[1 - active] == 0;
        if raises_forbidden {
            LegalActions::new(&[ActionKind::Fold, ActionKind::Call])
        } else {
            LegalActions::new(&[ActionKind::Fold, ActionKind::Call, ActionKind::Raise])
        }
    }

    /// Minimum and maximum legal raises, as absolute pip targets.
    #[must_use]
    pub fn raise_bounds(&self, id: StateId) -> (Chips, Chips) {
        let state = &self.states[id];
        let active = state.active();
        let continue_cost = state.continue_cost();
        let max_contribution =
            state.stacks[active].min(state.stacks[1 - active] + continue_cost);
        let min_contribution =
            max_contribution.min(continue_cost + continue_cost.max(self.settings.big_blind));
        (
            state.pips[active] + min_contribution,
            state.pips[active] + max_contribution,
        )
    }

    /// Advances the game tree by one action performed by the active
    /// player.
    pub fn proceed(&mut self, id: StateId, action: Action) -> Result<Transition, EngineError> {
        let state = self.states[id];
        let active = state.active();
        match action {
            Action::Fold => {
                let winner = if active == 0 { Winner::P1 } else { Winner::P0 };
                let delta = self.delta(id, winner);
                Ok(Transition::Terminal(TerminalState {
                    deltas: [delta, -delta],
                    bounty_hits: self.bounty_hits(id),
                    previous: id,
                }))
            }
            Action::Call => {
                if state.button == 0 {
                    // Small blind completes the big blind pre-flop.
                    let bb = self.settings.big_blind;
                    let stack = self.settings.starting_stack - bb;
                    let next = RoundState {
                        button: 1,
                        street: 0,
                        pips: [bb, bb],
                        stacks: [stack, stack],
                        previous: Some(id),
                    };
                    return Ok(Transition::Continue(self.push(next)));
                }
                // Both players have now acted and matched.
                let mut pips = state.pips;
                let mut stacks = state.stacks;
                let contribution = pips[1 - active] - pips[active];
                stacks[active] -= contribution;
                pips[active] += contribution;
                let settled = self.push(RoundState {
                    button: state.button + 1,
                    street: state.street,
                    pips,
                    stacks,
                    previous: Some(id),
                });
                self.proceed_street(settled)
            }
            Action::Check => {
                let both_acted =
                    (state.street == 0 && state.button > 0) || state.button > 1;
                if both_acted {
                    return self.proceed_street(id);
                }
                // Pass to the opponent.
                Ok(Transition::Continue(self.push(RoundState {
                    button: state.button + 1,
                    previous: Some(id),
                    ..state
                })))
            }
            Action::Raise(amount) => {
                let (min, max) = self.raise_bounds(id);
                if amount < min || amount > max {
                    return Err(EngineError::RaiseOutOfBounds { amount, min, max });
                }
                let mut pips = state.pips;
                let mut stacks = state.stacks;
                let contribution = amount - pips[active];
                stacks[active] -= contribution;
                pips[active] += contribution;
                Ok(Transition::Continue(self.push(RoundState {
                    button: state.button + 1,
                    street: state.street,
                    pips,
                    stacks,
                    previous: Some(id),
                })))
            }
        }
    }

    /// Resets the pips and advances the game tree to the next street
    /// of betting, or to showdown off the river.
    fn proceed_street(&mut self, id: StateId) -> Result<Transition, EngineError> {
        let state = self.states[id];
        if state.street == 5 {
            return Ok(Transition::Terminal(self.showdown(id)?));
        }
        let street = if state.street == 0 { 3 } else { state.street + 1 };
        // The out-of-position player opens every post-flop street.
        Ok(Transition::Continue(self.push(RoundState {
            button: 1,
            street,
            pips: [0, 0],
            stacks: state.stacks,
            previous: Some(id),
        })))
    }

    /// Compares the players' hands and settles the final payoff.
    fn showdown(&self, id: StateId) -> Result<TerminalState, EngineError> {
        let state = &self.states[id];
        if state.stacks[0] != state.stacks[1] {
            return Err(EngineError::ShowdownStacksUnequal(
                state.stacks[0],
                state.stacks[1],
            ));
        }
        let board = self.deck.peek(5);
        let score = |player: usize| {
            let mut cards = board.to_vec();
            cards.extend_from_slice(&self.hands[player]);
            functional::eval(&cards)
        };
        let winner = match score(0).cmp(&score(1)) {
            std::cmp::Ordering::Greater => Winner::P0,
            std::cmp::Ordering::Less => Winner::P1,
            std::cmp::Ordering::Equal => Winner::Split,
        };
        let delta = self.delta(id, winner);
        Ok(TerminalState {
            deltas: [delta, -delta],
            bounty_hits: self.bounty_hits(id),
            previous: id,
        })
    }

    /// Whether each player hit their bounty rank so far this round,
    /// via their own hole cards or any revealed community card.
    #[must_use]
    pub fn bounty_hits(&self, id: StateId) -> [bool; 2] {
        let street = self.states[id].street as usize;
        let board = if street == 0 { &[][..] } else { self.deck.peek(street) };
        let hit = |player: usize| {
            self.hands[player]
                .iter()
                .chain(board)
                .any(|card| card.value == self.bounties[player])
        };
        [hit(0), hit(1)]
    }

    /// Pot delta for player 0 after bounty rules are applied.
    ///
    /// Only the winner's bounty scales the pot; a split pays the lone
    /// hitter half the scaled surplus. Fractional results round toward
    /// a fixed side chosen by button parity so the pair stays zero-sum.
    fn delta(&self, id: StateId, winner: Winner) -> i64 {
        let state = &self.states[id];
        let hits = self.bounty_hits(id);
        let start = i64::from(self.settings.starting_stack);
        let ratio = self.settings.bounty_ratio;
        let constant = self.settings.bounty_constant as f64;
        let raw = match winner {
            Winner::Split => {
                let base = (start - i64::from(state.stacks[0])) as f64;
                if hits[0] && !hits[1] {
                    base * (ratio - 1.0) / 2.0 + constant
                } else if !hits[0] && hits[1] {
                    -(base * (ratio - 1.0) / 2.0 + constant)
                } else {
                    0.0
                }
            }
            Winner::P0 => {
                let gain = (start - i64::from(state.stacks[1])) as f64;
                if hits[0] { gain * ratio + constant } else { gain }
            }
            Winner::P1 => {
                let loss = (i64::from(state.stacks[0]) - start) as f64;
                if hits[1] { loss * ratio - constant } else { loss }
            }
        };
        if (raw - raw.floor()).abs() > 1e-6 {
            if state.button % 2 == 0 {
                raw.floor() as i64
            } else {
                raw.ceil() as i64
            }
        } else {
            raw as i64
        }
    }

    fn push(&mut self, state: RoundState) -> StateId {
        debug_assert_eq!(
            state.pips[0] + state.stacks[0] + state.pips[1] + state.stacks[1],
            2 * self.settings.starting_stack
        );
        self.states.push(state);
        self.states.len() - 1
    }
}
