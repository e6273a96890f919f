/// End-to-end match tests driving the runner with absent bots, which
/// play forced defaults for every decision.
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;

use bounty_holdem::{MatchConfig, MatchRunner, Peer, PlayerSpec};

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "bounty_holdem_it_{tag}_{}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Connects a bot thread that completes the blind, calls every raise,
/// and checks everything else, so every round reaches showdown.
fn scripted_peer(name: &str, config: &MatchConfig) -> Peer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let stream = TcpStream::connect(addr).unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                return;
            }
            let clauses: Vec<&str> = line.split_whitespace().collect();
            if clauses.iter().any(|c| *c == "Q") {
                return;
            }
            let fresh_deal = clauses.iter().any(|c| c.starts_with('H'));
            let small_blind = clauses.iter().any(|c| *c == "P0");
            let response = match clauses.last() {
                Some(last) if last.starts_with('R') => "C",
                Some(last) if last.starts_with('G') && fresh_deal && small_blind => "C",
                _ => "K",
            };
            writeln!(&stream, "{response}").unwrap();
        }
    });
    let (engine_side, _) = listener.accept().unwrap();
    let mut peer = Peer::new(name, None, config.game_clock, config.peer_config());
    peer.attach(engine_side).unwrap();
    peer
}

#[test]
fn scripted_socket_bots_play_a_full_match_to_showdown() {
    let dir = scratch_dir("sockets");
    let config = MatchConfig {
        players: [
            PlayerSpec::absent("caller_a"),
            PlayerSpec::absent("caller_b"),
        ],
        num_rounds: 20,
        log_dir: dir.clone(),
        log_name: "socket_gamelog".to_string(),
        ..MatchConfig::default()
    };
    let peers = [
        scripted_peer("caller_a", &config),
        scripted_peer("caller_b", &config),
    ];
    let outcome = MatchRunner::new(config).run_with(peers).unwrap();
    assert_eq!(outcome.bankrolls[0] + outcome.bankrolls[1], 0);

    let log = fs::read_to_string(&outcome.log_path).unwrap();
    // Callers never fold, so every round is checked down to a reveal.
    assert!(!log.contains("folds"));
    assert!(log.contains("shows ["));
    assert!(log.contains("River ["));
    // Every street reveal carries the running stacks.
    assert_eq!(
        log.matches("Current stacks: ").count(),
        3 * log.matches("Flop [").count()
    );
    assert_eq!(log.matches("Round #").count(), 20);
    fs::remove_dir_all(dir).ok();
}

#[test]
fn match_log_replays_every_round_in_order() {
    let dir = scratch_dir("log_shape");
    let config = MatchConfig {
        players: [PlayerSpec::absent("hero"), PlayerSpec::absent("villain")],
        num_rounds: 4,
        rounds_per_bounty: 1,
        log_dir: dir.clone(),
        log_name: "shape_gamelog".to_string(),
        ..MatchConfig::default()
    };
    let outcome = MatchRunner::new(config).run().unwrap();
    let log = fs::read_to_string(&outcome.log_path).unwrap();
    let lines: Vec<&str> = log.lines().collect();

    assert_eq!(lines[0], "hero vs villain");
    // Every round replays the same shape: header, the bounty redraw,
    // blinds, deals, the forced fold, the award lines, and the running
    // winning counts.
    for round in 1..=4 {
        let header = lines
            .iter()
            .position(|l| l.starts_with(&format!("Round #{round},")))
            .unwrap();
        assert!(lines[header + 1].starts_with("Bounties reset to "));
        assert!(lines[header + 2].contains("posts the blind of 1"));
        assert!(lines[header + 3].contains("posts the blind of 2"));
        assert!(lines[header + 4].contains("dealt ["));
        assert!(lines[header + 5].contains("dealt ["));
        assert!(lines[header + 6].ends_with("folds"));
        assert!(lines[header + 7].contains("awarded"));
        assert!(lines[header + 8].contains("awarded"));
        assert!(lines[header + 9].starts_with("Winning counts at the end of the round:"));
    }
    // Seats swap each round, so the small blind alternates.
    assert!(log.contains("hero posts the blind of 1"));
    assert!(log.contains("villain posts the blind of 1"));
    assert!(lines.last().unwrap().starts_with("Final"));
    fs::remove_dir_all(dir).ok();
}

#[test]
fn raw_output_captures_are_written_for_both_players() {
    let dir = scratch_dir("captures");
    let config = MatchConfig {
        players: [PlayerSpec::absent("hero"), PlayerSpec::absent("villain")],
        num_rounds: 1,
        log_dir: dir.clone(),
        log_name: "capture_gamelog".to_string(),
        ..MatchConfig::default()
    };
    MatchRunner::new(config).run().unwrap();
    assert!(dir.join("hero.txt").exists());
    assert!(dir.join("villain.txt").exists());
    fs::remove_dir_all(dir).ok();
}

#[test]
fn bankrolls_stay_zero_sum_across_many_rounds() {
    let dir = scratch_dir("zero_sum");
    let config = MatchConfig {
        players: [PlayerSpec::absent("hero"), PlayerSpec::absent("villain")],
        num_rounds: 101,
        log_dir: dir.clone(),
        log_name: "zero_sum_gamelog".to_string(),
        ..MatchConfig::default()
    };
    let outcome = MatchRunner::new(config).run().unwrap();
    assert_eq!(outcome.bankrolls[0] + outcome.bankrolls[1], 0);
    fs::remove_dir_all(dir).ok();
}
