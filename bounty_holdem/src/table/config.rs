//! Match configuration models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::game::constants;
use crate::game::entities::GameSettings;
use crate::net::PeerConfig;

/// One entrant in a match: a display name plus the directory holding
/// its `commands.json`. A spec without a path fields a bot that never
/// connects and plays forced defaults for the whole match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpec {
    pub name: String,
    pub path: Option<PathBuf>,
}

impl PlayerSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: Some(path.into()),
        }
    }

    #[must_use]
    pub fn absent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
        }
    }
}

/// Full configuration for one heads-up match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Entrants in seat order for round one.
    pub players: [PlayerSpec; 2],

    /// Number of rounds to play.
    pub num_rounds: u32,

    /// Rounds between bounty redraws.
    pub rounds_per_bounty: u32,

    /// Per-player wall-clock budget in seconds for the whole match.
    pub game_clock: f64,

    /// Whether response latency is charged against the game clock.
    pub enforce_game_clock: bool,

    /// Blinds, stacks, and bounty payout parameters.
    pub settings: GameSettings,

    /// Directory receiving the match log and raw player output.
    pub log_dir: PathBuf,

    /// Basename of the match log file, without extension.
    pub log_name: String,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            players: [PlayerSpec::absent("player_1"), PlayerSpec::absent("player_2")],
            num_rounds: constants::NUM_ROUNDS,
            rounds_per_bounty: constants::ROUNDS_PER_BOUNTY,
            game_clock: constants::STARTING_GAME_CLOCK,
            enforce_game_clock: true,
            settings: GameSettings::default(),
            log_dir: PathBuf::from("."),
            log_name: "gamelog".to_string(),
        }
    }
}

impl MatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.players[0].name == self.players[1].name {
            return Err("Players must have distinct names".to_string());
        }

        if self.num_rounds == 0 {
            return Err("Match must run at least one round".to_string());
        }

        if self.rounds_per_bounty == 0 {
            return Err("Bounty redraw cadence must be at least one round".to_string());
        }

        if self.settings.big_blind <= self.settings.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.settings.starting_stack < self.settings.big_blind {
            return Err("Starting stack must cover the big blind".to_string());
        }

        Ok(())
    }

    /// Peer transport settings derived from this configuration.
    #[must_use]
    pub fn peer_config(&self) -> PeerConfig {
        PeerConfig {
            enforce_game_clock: self.enforce_game_clock,
            log_dir: self.log_dir.clone(),
            ..PeerConfig::default()
        }
    }

    /// Path of the match log file.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.log_dir.join(format!("{}.txt", self.log_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(MatchConfig::default().validate().is_ok());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut config = MatchConfig::default();
        config.players[1].name = config.players[0].name.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_rounds_are_rejected() {
        let config = MatchConfig {
            num_rounds: 0,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
