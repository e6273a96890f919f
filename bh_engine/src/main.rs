//! Heads-up bounty hold'em match runner.
//!
//! Builds and runs two bot programs, arbitrates a full match between
//! them, and writes the replayable match log.

use std::path::PathBuf;

use anyhow::Error;
use bounty_holdem::{MatchConfig, MatchRunner, PlayerSpec, constants};
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;

const HELP: &str = "\
Run a heads-up bounty hold'em match between two bots

USAGE:
  bh_engine [OPTIONS] <PLAYER_1_PATH> <PLAYER_2_PATH>

ARGS:
  <PLAYER_1_PATH>          Directory holding the first bot's commands.json
  <PLAYER_2_PATH>          Directory holding the second bot's commands.json

OPTIONS:
  --name-1     NAME        First bot's display name   [default: player_1]
  --name-2     NAME        Second bot's display name  [default: player_2]
  --rounds     N           Rounds to play             [default: env NUM_ROUNDS or 1000]
  --clock      SECONDS     Game clock per player      [default: env GAME_CLOCK or 60]
  --log-dir    PATH        Output directory           [default: .]
  --log-name   NAME        Match log basename         [default: gamelog]

FLAGS:
  --no-clock               Measure response latency without charging it
  -h, --help               Print help information

ENVIRONMENT:
  NUM_ROUNDS               Rounds to play
  GAME_CLOCK               Game clock per player, in seconds
";

struct Args {
    paths: [PathBuf; 2],
    names: [String; 2],
    num_rounds: u32,
    game_clock: f64,
    enforce_game_clock: bool,
    log_dir: PathBuf,
    log_name: String,
}

fn parse_args() -> Result<Args, Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        names: [
            pargs
                .value_from_str("--name-1")
                .unwrap_or_else(|_| "player_1".to_string()),
            pargs
                .value_from_str("--name-2")
                .unwrap_or_else(|_| "player_2".to_string()),
        ],
        num_rounds: pargs.value_from_str("--rounds").unwrap_or_else(|_| {
            std::env::var("NUM_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(constants::NUM_ROUNDS)
        }),
        game_clock: pargs.value_from_str("--clock").unwrap_or_else(|_| {
            std::env::var("GAME_CLOCK")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(constants::STARTING_GAME_CLOCK)
        }),
        enforce_game_clock: !pargs.contains("--no-clock"),
        log_dir: pargs
            .value_from_str("--log-dir")
            .unwrap_or_else(|_| PathBuf::from(".")),
        log_name: pargs
            .value_from_str("--log-name")
            .unwrap_or_else(|_| "gamelog".to_string()),
        paths: [
            pargs.free_from_str()?,
            pargs.free_from_str()?,
        ],
    };
    Ok(args)
}

fn main() -> Result<(), Error> {
    let args = parse_args()?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = MatchConfig {
        players: [
            PlayerSpec::new(args.names[0].clone(), args.paths[0].clone()),
            PlayerSpec::new(args.names[1].clone(), args.paths[1].clone()),
        ],
        num_rounds: args.num_rounds,
        game_clock: args.game_clock,
        enforce_game_clock: args.enforce_game_clock,
        log_dir: args.log_dir,
        log_name: args.log_name,
        ..MatchConfig::default()
    };

    info!(
        "{} vs {} over {} rounds",
        config.players[0].name, config.players[1].name, config.num_rounds
    );
    let outcome = MatchRunner::new(config).run()?;

    for (name, bankroll) in outcome.names.iter().zip(outcome.bankrolls) {
        info!("{name} finished with {bankroll}");
    }
    info!("match log written to {}", outcome.log_path.display());
    Ok(())
}
