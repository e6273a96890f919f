//! Match configuration and orchestration.

pub mod config;
pub mod runner;

pub use config::{MatchConfig, PlayerSpec};
pub use runner::{MatchError, MatchOutcome, MatchRunner};
