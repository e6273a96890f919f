use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants;

/// Card values run 2..=14 with aces high.
pub type Value = u8;

/// Rank characters indexed by `value - 2`, matching the two-character
/// card format shared with peer bots.
const VALUE_CHARS: [char; 13] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];

/// Character for a card value in the common wire format.
pub fn value_char(value: Value) -> char {
    VALUE_CHARS[value as usize - 2]
}

/// Parses a rank character from the common wire format.
pub fn value_from_char(c: char) -> Option<Value> {
    VALUE_CHARS
        .iter()
        .position(|&v| v == c)
        .map(|i| i as Value + 2)
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Self; 4] = [Self::Clubs, Self::Diamonds, Self::Hearts, Self::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Clubs => 'c',
            Self::Diamonds => 'd',
            Self::Hearts => 'h',
            Self::Spades => 's',
        };
        write!(f, "{repr}")
    }
}

/// A playing card in the two-character common format, e.g. `Ah` or `Td`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card {
    pub value: Value,
    pub suit: Suit,
}

impl Card {
    #[must_use]
    pub const fn new(value: Value, suit: Suit) -> Self {
        Self { value, suit }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", value_char(self.value), self.suit)
    }
}

impl std::str::FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(v), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("not a card: {s:?}"));
        };
        let value = value_from_char(v).ok_or_else(|| format!("bad card value: {s:?}"))?;
        let suit = match su {
            'c' => Suit::Clubs,
            'd' => Suit::Diamonds,
            'h' => Suit::Hearts,
            's' => Suit::Spades,
            _ => return Err(format!("bad card suit: {s:?}")),
        };
        Ok(Self { value, suit })
    }
}

/// A 52-card deck with a deal cursor. Community cards are dealt up front
/// and stay in place behind the cursor, so [`Deck::peek`] can reveal them
/// street by street without mutating the deck.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: [Card; 52],
    cursor: usize,
}

impl Deck {
    /// A deck in a fixed order, for replays and deterministic tests.
    #[must_use]
    pub const fn from_cards(cards: [Card; 52]) -> Self {
        Self { cards, cursor: 0 }
    }

    pub fn shuffle(&mut self, rng: &mut impl Rng) {
        self.cards.shuffle(rng);
        self.cursor = 0;
    }

    /// Removes the next `n` cards from the deck.
    pub fn deal(&mut self, n: usize) -> Vec<Card> {
        let dealt = self.cards[self.cursor..self.cursor + n].to_vec();
        self.cursor += n;
        dealt
    }

    /// Reads the next `n` cards without removing them.
    #[must_use]
    pub fn peek(&self, n: usize) -> &[Card] {
        &self.cards[self.cursor..self.cursor + n]
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = [Card::new(2, Suit::Clubs); 52];
        for (i, value) in (2u8..=14).enumerate() {
            for (j, suit) in Suit::ALL.into_iter().enumerate() {
                cards[4 * i + j] = Card::new(value, suit);
            }
        }
        Self { cards, cursor: 0 }
    }
}

/// Type alias for whole chips. Stacks and street contributions are never
/// negative; round deltas are signed and live in `i64`.
pub type Chips = u32;

/// A betting action. The raise amount is the absolute pip target for the
/// current street, not an increment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Fold,
    Call,
    Check,
    Raise(Chips),
}

impl Action {
    #[must_use]
    pub const fn kind(self) -> ActionKind {
        match self {
            Self::Fold => ActionKind::Fold,
            Self::Call => ActionKind::Call,
            Self::Check => ActionKind::Check,
            Self::Raise(_) => ActionKind::Raise,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "folds"),
            Self::Call => write!(f, "calls"),
            Self::Check => write!(f, "checks"),
            Self::Raise(amount) => write!(f, "raises to {amount}"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ActionKind {
    Fold,
    Call,
    Check,
    Raise,
}

impl ActionKind {
    const fn bit(self) -> u8 {
        match self {
            Self::Fold => 1,
            Self::Call => 1 << 1,
            Self::Check => 1 << 2,
            Self::Raise => 1 << 3,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold",
            Self::Call => "call",
            Self::Check => "check",
            Self::Raise => "raise",
        };
        write!(f, "{repr}")
    }
}

/// The set of action kinds legal for the active player.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LegalActions(u8);

impl LegalActions {
    #[must_use]
    pub const fn new(kinds: &[ActionKind]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    /// The set left when neither player can put more chips in.
    #[must_use]
    pub const fn check_only() -> Self {
        Self::new(&[ActionKind::Check])
    }

    #[must_use]
    pub const fn contains(self, kind: ActionKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// The forced action substituted when a peer cannot or does not
    /// produce a legal one.
    #[must_use]
    pub const fn default_action(self) -> Action {
        if self.contains(ActionKind::Check) {
            Action::Check
        } else {
            Action::Fold
        }
    }
}

/// Betting parameters for one match, fixed for all of its rounds.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameSettings {
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub starting_stack: Chips,
    /// Multiplier applied to a winner's raw gain when their bounty hit.
    pub bounty_ratio: f64,
    /// Flat chips added on top of a bounty-scaled gain.
    pub bounty_constant: i64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            small_blind: constants::SMALL_BLIND,
            big_blind: constants::BIG_BLIND,
            starting_stack: constants::STARTING_STACK,
            bounty_ratio: constants::BOUNTY_RATIO,
            bounty_constant: constants::BOUNTY_CONSTANT,
        }
    }
}
