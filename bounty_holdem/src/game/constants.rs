//! Default match parameters.

use std::time::Duration;

use super::entities::Chips;

pub const SMALL_BLIND: Chips = 1;
pub const BIG_BLIND: Chips = 2;
pub const STARTING_STACK: Chips = 400;

/// Rounds played per match.
pub const NUM_ROUNDS: u32 = 1000;

/// Both players draw a fresh bounty rank every this many rounds.
pub const ROUNDS_PER_BOUNTY: u32 = 25;

/// Multiplier applied to a winner's raw gain when their bounty hit.
pub const BOUNTY_RATIO: f64 = 1.5;

/// Flat chips added on top of a bounty-scaled gain.
pub const BOUNTY_CONSTANT: i64 = 10;

/// Wall-clock budget each peer has for all of its responses in a match.
pub const STARTING_GAME_CLOCK: f64 = 60.0;

/// How long a peer's build command may run.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a peer has to open its socket connection after startup.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking-read bound for a single peer response.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a peer process may take to exit after the quit message.
pub const QUIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Size cap for each peer's captured raw output.
pub const PLAYER_LOG_SIZE_LIMIT: u64 = 524_288;
