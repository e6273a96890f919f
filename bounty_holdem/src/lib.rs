//! # Bounty Hold'em
//!
//! A heads-up Texas Hold'em match engine with a secret bounty-rank
//! side bet, for pitting two bot programs against each other.
//!
//! Each player carries a hidden bounty rank, redrawn on a fixed
//! cadence. Winning a round while holding or hitting the bounty rank
//! scales the winner's gain; the pair of round deltas always sums to
//! zero, so a match is a closed chip system.
//!
//! ## Architecture
//!
//! A match is a loop over rounds. Within a round the betting tree is a
//! pure state machine: every decision point is a [`game::RoundState`]
//! in an arena, and [`game::Round::proceed`] is the only way states
//! advance. Around that core:
//!
//! - the engine talks to each bot over a line-based TCP protocol, one
//!   clause-separated message per decision and one action token back;
//! - each bot's wall-clock budget is spent on its response latency and
//!   never replenished, and an exhausted budget demotes the bot to
//!   forced default actions for the rest of the match;
//! - every round is appended to a human-readable, replayable match log.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, the round state machine, and hand evaluation
//! - [`net`]: the peer protocol and bot process management
//! - [`table`]: match configuration and orchestration
//!
//! ## Example
//!
//! ```
//! use bounty_holdem::{MatchConfig, PlayerSpec};
//!
//! let mut config = MatchConfig::default();
//! config.players = [
//!     PlayerSpec::new("alice", "bots/alice"),
//!     PlayerSpec::new("bob", "bots/bob"),
//! ];
//! assert!(config.validate().is_ok());
//! ```

/// Cards, the round state machine, and hand evaluation.
pub mod game;
pub use game::{
    Round, RoundState, TerminalState, Transition,
    constants,
    entities::{self, Action, Card, GameSettings, LegalActions},
    functional,
};

/// Networking components for engine-to-bot communication.
pub mod net;
pub use net::{Peer, PeerConfig, messages};

/// Match configuration and orchestration.
pub mod table;
pub use table::{MatchConfig, MatchOutcome, MatchRunner, PlayerSpec};
