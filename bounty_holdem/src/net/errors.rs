//! Error taxonomy for peer communication.

use thiserror::Error;

use crate::game::entities::{ActionKind, Chips};

/// Recoverable violations of the wire protocol by a peer. Each one is
/// logged and replaced by a forced default action; the match continues.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("attempted illegal {0}")]
    IllegalAction(ActionKind),
    #[error("raise to {amount} outside bounds [{min}, {max}]")]
    RaiseOutOfBounds { amount: Chips, min: Chips, max: Chips },
    #[error("response misformatted: {0:?}")]
    Malformed(String),
}

/// Failures that permanently disable a peer: its game clock is zeroed
/// and every remaining decision becomes the forced default.
#[derive(Debug, Error)]
pub enum PeerError {
    #[error("timed out waiting to connect")]
    ConnectTimeout,
    #[error("ran out of time")]
    ClockExhausted,
    #[error("disconnected: {0}")]
    Io(#[from] std::io::Error),
    #[error("commands.json unusable: {0}")]
    BadCommands(String),
}
