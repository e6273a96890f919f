//! Poker game engine - core round state machine and game logic.
//!
//! This module provides the foundational pieces of a heads-up bounty
//! hold'em round:
//! - Cards, decks, actions, and betting settings
//! - The round state machine (arena of betting states + terminal payouts)
//! - Seven-card hand evaluation

pub mod constants;
pub mod entities;
pub mod functional;
pub mod state_machine;

pub use state_machine::{
    EngineError, Round, RoundState, StateId, TerminalState, Transition,
};
