//! Match orchestration.
//!
//! [`MatchRunner`] drives a full heads-up match: it builds and starts
//! both bots, deals and arbitrates every round through the
//! [`Round`](crate::game::Round) state machine, keeps each player's
//! protocol message buffer and the human-readable match log, and
//! settles bankrolls from round deltas. Seats (and with them the
//! blinds and bounties) swap after every round.

use std::fs;
use std::path::PathBuf;

use log::info;
use rand::Rng;
use thiserror::Error;

use crate::game::entities::{Action, ActionKind, Card, Deck, Value, value_char};
use crate::game::state_machine::{EngineError, Round, StateId, TerminalState, Transition};
use crate::net::messages::Clause;
use crate::net::peer::Peer;

use super::config::MatchConfig;

/// Errors that abort a match.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("could not write match log: {0}")]
    Io(#[from] std::io::Error),
}

/// Final standings of a completed match, in the configured seat order.
#[derive(Clone, Debug)]
pub struct MatchOutcome {
    pub names: [String; 2],
    pub bankrolls: [i64; 2],
    pub log_path: PathBuf,
}

/// Runs one match between two bots and writes the replayable log.
pub struct MatchRunner {
    config: MatchConfig,
    log: Vec<String>,
    player_messages: [Vec<String>; 2],
}

fn pcards(cards: &[Card]) -> String {
    format!(
        "[{}]",
        cards
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    )
}

fn status(peers: &[Peer; 2]) -> String {
    peers
        .iter()
        .map(|p| format!(", {} ({})", p.name, p.bankroll))
        .collect()
}

fn draw_bounty(rng: &mut impl Rng) -> Value {
    rng.random_range(2..=14)
}

impl MatchRunner {
    #[must_use]
    pub fn new(config: MatchConfig) -> Self {
        let header = format!(
            "{} vs {}",
            config.players[0].name, config.players[1].name
        );
        Self {
            config,
            log: vec![header],
            player_messages: [Vec::new(), Vec::new()],
        }
    }

    /// Builds and starts both configured bots, then plays the match.
    pub fn run(self) -> Result<MatchOutcome, MatchError> {
        self.config.validate().map_err(MatchError::Config)?;
        let peer_config = self.config.peer_config();
        let [spec0, spec1] = self.config.players.clone();
        let clock = self.config.game_clock;
        let mut peers = [
            Peer::new(spec0.name, spec0.path, clock, peer_config.clone()),
            Peer::new(spec1.name, spec1.path, clock, peer_config),
        ];
        for peer in &mut peers {
            peer.build();
        }
        for peer in &mut peers {
            peer.start();
        }
        self.run_with(peers)
    }

    /// Plays the configured number of rounds against already-connected
    /// peers and writes the match log. Peers must sit in the
    /// configured seat order.
    pub fn run_with(mut self, mut peers: [Peer; 2]) -> Result<MatchOutcome, MatchError> {
        self.config.validate().map_err(MatchError::Config)?;
        info!("starting the match engine");
        let mut rng = rand::rng();
        // Round 1 always redraws, so the seed values are never dealt.
        let mut bounties: [Value; 2] = [2, 2];
        for round_num in 1..=self.config.num_rounds {
            self.log.push(String::new());
            self.log
                .push(format!("Round #{round_num}{}", status(&peers)));
            if (round_num - 1) % self.config.rounds_per_bounty == 0 {
                bounties = [draw_bounty(&mut rng), draw_bounty(&mut rng)];
                self.log.push(format!(
                    "Bounties reset to {} for player {} and {} for player {}",
                    value_char(bounties[0]),
                    peers[0].name,
                    value_char(bounties[1]),
                    peers[1].name,
                ));
            }
            let mut deck = Deck::default();
            deck.shuffle(&mut rng);
            self.run_round(&mut peers, deck, bounties)?;
            self.log.push(format!(
                "Winning counts at the end of the round: {}",
                status(&peers)
            ));
            // The blinds and the bounties travel with the players.
            peers.swap(0, 1);
            bounties.swap(0, 1);
        }
        self.log.push(String::new());
        self.log.push(format!("Final{}", status(&peers)));
        for peer in &mut peers {
            peer.stop();
        }

        let log_path = self.config.log_path();
        info!("writing the match log to {}", log_path.display());
        fs::write(&log_path, self.log.join("\n") + "\n")?;

        let names = [
            self.config.players[0].name.clone(),
            self.config.players[1].name.clone(),
        ];
        let bankrolls = if peers[0].name == names[0] {
            [peers[0].bankroll, peers[1].bankroll]
        } else {
            [peers[1].bankroll, peers[0].bankroll]
        };
        Ok(MatchOutcome {
            names,
            bankrolls,
            log_path,
        })
    }

    /// Plays one round to its terminal state and settles bankrolls.
    fn run_round(
        &mut self,
        peers: &mut [Peer; 2],
        deck: Deck,
        bounties: [Value; 2],
    ) -> Result<(), MatchError> {
        let mut round = Round::new(self.config.settings.clone(), deck, bounties);
        let mut id = Round::ROOT;
        loop {
            self.log_betting_state(peers, &round, id);
            let active = round.state(id).active();
            let legal = round.legal_actions(id);
            let bounds = if legal.contains(ActionKind::Raise) {
                Some(round.raise_bounds(id))
            } else {
                None
            };
            let action = peers[active].query(
                legal,
                bounds,
                &mut self.player_messages[active],
                &mut self.log,
            );
            let bet_override = round.state(id).pips == [0, 0];
            self.log_action(&peers[active].name, action, bet_override);
            match round.proceed(id, action)? {
                Transition::Continue(next) => id = next,
                Transition::Terminal(terminal) => {
                    if terminal.deltas[0] + terminal.deltas[1] != 0 {
                        return Err(EngineError::NonZeroSumDeltas(
                            terminal.deltas[0],
                            terminal.deltas[1],
                        )
                        .into());
                    }
                    let showdown = !matches!(action, Action::Fold);
                    self.log_terminal_state(peers, &round, &terminal, showdown);
                    // One last exchange per player delivers the round
                    // outcome; the response is an ignored ack.
                    for (seat, peer) in peers.iter_mut().enumerate() {
                        peer.ack(&mut self.player_messages[seat], &mut self.log);
                        peer.bankroll += terminal.deltas[seat];
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Records the deal or a newly revealed street, in both the match
    /// log and the players' pending messages.
    fn log_betting_state(&mut self, peers: &[Peer; 2], round: &Round, id: StateId) {
        let state = *round.state(id);
        if state.street == 0 && state.button == 0 {
            let settings = &self.config.settings;
            let hands = round.hands();
            let bounties = round.bounties();
            self.log.push(format!(
                "{} posts the blind of {}",
                peers[0].name, settings.small_blind
            ));
            self.log.push(format!(
                "{} posts the blind of {}",
                peers[1].name, settings.big_blind
            ));
            self.log
                .push(format!("{} dealt {}", peers[0].name, pcards(&hands[0])));
            self.log
                .push(format!("{} dealt {}", peers[1].name, pcards(&hands[1])));
            for seat in 0..2 {
                self.player_messages[seat] = vec![
                    Clause::Clock(0.0).to_string(),
                    Clause::Seat(seat).to_string(),
                    Clause::Hole(hands[seat]).to_string(),
                    Clause::Bounty(bounties[seat]).to_string(),
                ];
            }
        } else if state.street > 0 && state.button == 1 {
            let board = round.board(state.street);
            let street_name = match state.street {
                3 => "Flop",
                4 => "Turn",
                _ => "River",
            };
            let start = self.config.settings.starting_stack;
            self.log.push(format!(
                "{} {}, {} ({}), {} ({})",
                street_name,
                pcards(board),
                peers[0].name,
                start - state.stacks[0],
                peers[1].name,
                start - state.stacks[1],
            ));
            self.log.push(format!(
                "Current stacks: {}, {}",
                state.stacks[0], state.stacks[1]
            ));
            let clause = Clause::Board(board.to_vec()).to_string();
            self.player_messages[0].push(clause.clone());
            self.player_messages[1].push(clause);
        }
    }

    fn log_action(&mut self, name: &str, action: Action, bet_override: bool) {
        let entry = match action {
            // An opening raise reads as a bet.
            Action::Raise(amount) if bet_override => format!("{name} bets {amount}"),
            _ => format!("{name} {action}"),
        };
        self.log.push(entry);
        let code = Clause::History(action).to_string();
        self.player_messages[0].push(code.clone());
        self.player_messages[1].push(code);
    }

    /// Records the round outcome: the showdown reveal when one
    /// happened, the awarded deltas, and the bounty-hit flags with the
    /// loser's flag masked from both players.
    fn log_terminal_state(
        &mut self,
        peers: &[Peer; 2],
        round: &Round,
        terminal: &TerminalState,
        showdown: bool,
    ) {
        let hands = round.hands();
        if showdown {
            self.log
                .push(format!("{} shows {}", peers[0].name, pcards(&hands[0])));
            self.log
                .push(format!("{} shows {}", peers[1].name, pcards(&hands[1])));
            self.player_messages[0].push(Clause::Reveal(hands[1]).to_string());
            self.player_messages[1].push(Clause::Reveal(hands[0]).to_string());
        }
        self.log
            .push(format!("{} awarded {}", peers[0].name, terminal.deltas[0]));
        self.log
            .push(format!("{} awarded {}", peers[1].name, terminal.deltas[1]));
        self.player_messages[0].push(Clause::Delta(terminal.deltas[0]).to_string());
        self.player_messages[1].push(Clause::Delta(terminal.deltas[1]).to_string());

        let [hit0, hit1] = terminal.bounty_hits;
        let (to0, to1) = if terminal.deltas[0] > 0 {
            (
                Clause::BountyHits {
                    own: Some(hit0),
                    opponent: None,
                },
                Clause::BountyHits {
                    own: None,
                    opponent: Some(hit0),
                },
            )
        } else if terminal.deltas[1] > 0 {
            (
                Clause::BountyHits {
                    own: None,
                    opponent: Some(hit1),
                },
                Clause::BountyHits {
                    own: Some(hit1),
                    opponent: None,
                },
            )
        } else {
            (
                Clause::BountyHits {
                    own: Some(hit0),
                    opponent: Some(hit1),
                },
                Clause::BountyHits {
                    own: Some(hit1),
                    opponent: Some(hit0),
                },
            )
        };
        self.player_messages[0].push(to0.to_string());
        self.player_messages[1].push(to1.to_string());
    }
}
