//! Subprocess and socket plumbing for one peer bot.
//!
//! A [`Peer`] owns everything match-scoped about one player: the spawned
//! bot process, the line-oriented socket to it, the bounded drain of its
//! raw output, its bankroll, and its game clock. The clock is spent only
//! on response latency and is never replenished; once it reaches zero
//! the peer is done being asked anything for the rest of the match.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::Deserialize;

use crate::game::constants;
use crate::game::entities::{Action, Chips, LegalActions};

use super::errors::PeerError;
use super::messages::{Clause, decode_action};

/// Transport and resource knobs for peer handling.
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// How long a peer's build command may run.
    pub build_timeout: Duration,
    /// How long a peer has to open its socket connection.
    pub connect_timeout: Duration,
    /// Blocking-read bound for a single response.
    pub response_timeout: Duration,
    /// How long a bot process may take to exit after the quit message.
    pub quit_timeout: Duration,
    /// When false, response latency is measured but not charged.
    pub enforce_game_clock: bool,
    /// Bound on buffered child-output lines awaiting final capture.
    pub output_capacity: usize,
    /// Size cap for the captured raw-output file.
    pub output_limit: u64,
    /// Directory receiving each peer's raw-output capture.
    pub log_dir: PathBuf,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            build_timeout: constants::BUILD_TIMEOUT,
            connect_timeout: constants::CONNECT_TIMEOUT,
            response_timeout: constants::RESPONSE_TIMEOUT,
            quit_timeout: constants::QUIT_TIMEOUT,
            enforce_game_clock: true,
            output_capacity: 4096,
            output_limit: constants::PLAYER_LOG_SIZE_LIMIT,
            log_dir: PathBuf::from("."),
        }
    }
}

/// Contents of a bot directory's `commands.json`.
#[derive(Clone, Debug, Deserialize)]
struct Commands {
    build: Vec<String>,
    run: Vec<String>,
}

/// Handles subprocess and socket interactions with one player's bot.
pub struct Peer {
    pub name: String,
    path: Option<PathBuf>,
    config: PeerConfig,
    /// Remaining wall-clock budget in seconds.
    pub game_clock: f64,
    pub bankroll: i64,
    commands: Option<Commands>,
    child: Option<Child>,
    reader: Option<BufReader<TcpStream>>,
    writer: Option<TcpStream>,
    output_rx: Option<Receiver<String>>,
    output: Vec<String>,
}

impl Peer {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: Option<PathBuf>,
        game_clock: f64,
        config: PeerConfig,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            config,
            game_clock,
            bankroll: 0,
            commands: None,
            child: None,
            reader: None,
            writer: None,
            output_rx: None,
            output: Vec::new(),
        }
    }

    /// Loads the commands file and builds the bot, if it has a build
    /// step. Problems are logged and leave the peer unrunnable; they
    /// never abort the match.
    pub fn build(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        match Self::load_commands(&path) {
            Ok(commands) => self.commands = Some(commands),
            Err(error) => {
                warn!("{}: {error}", self.name);
                return;
            }
        }
        let build = self
            .commands
            .as_ref()
            .map(|c| c.build.clone())
            .unwrap_or_default();
        if build.is_empty() {
            return;
        }
        if let Err(error) = self.run_build(&path, &build) {
            warn!("{} build failed: {error}", self.name);
        }
    }

    fn load_commands(path: &Path) -> Result<Commands, PeerError> {
        let file = File::open(path.join("commands.json"))
            .map_err(|e| PeerError::BadCommands(e.to_string()))?;
        let commands: Commands =
            serde_json::from_reader(file).map_err(|e| PeerError::BadCommands(e.to_string()))?;
        if commands.run.is_empty() {
            return Err(PeerError::BadCommands("empty run command".to_string()));
        }
        Ok(commands)
    }

    fn run_build(&mut self, path: &Path, build: &[String]) -> Result<(), PeerError> {
        let mut child = Command::new(&build[0])
            .args(&build[1..])
            .current_dir(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(PeerError::Io)?;
        let deadline = Instant::now() + self.config.build_timeout;
        let finished = loop {
            if child.try_wait().map_err(PeerError::Io)?.is_some() {
                break true;
            }
            if Instant::now() >= deadline {
                break false;
            }
            thread::sleep(Duration::from_millis(50));
        };
        if !finished {
            let entry = format!("timed out waiting for {} to build", self.name);
            warn!("{entry}");
            self.output.push(entry);
            let _ = child.kill();
            let _ = child.wait();
        }
        for pipe in [
            child.stdout.take().map(|p| Box::new(p) as Box<dyn Read>),
            child.stderr.take().map(|p| Box::new(p) as Box<dyn Read>),
        ]
        .into_iter()
        .flatten()
        {
            let mut captured = String::new();
            let mut pipe = pipe;
            let _ = pipe.read_to_string(&mut captured);
            self.output
                .extend(captured.lines().map(ToString::to_string));
        }
        Ok(())
    }

    /// Runs the bot and establishes the socket connection. A peer that
    /// fails to start or connect forfeits: its clock is zeroed and all
    /// of its decisions fall back to the forced default.
    pub fn start(&mut self) {
        if let Err(error) = self.try_start() {
            warn!("{}: {error}", self.name);
            self.game_clock = 0.0;
        }
    }

    fn try_start(&mut self) -> Result<(), PeerError> {
        let (Some(path), Some(commands)) = (self.path.clone(), self.commands.clone()) else {
            return Err(PeerError::BadCommands("no runnable bot".to_string()));
        };
        let listener = TcpListener::bind("127.0.0.1:0").map_err(PeerError::Io)?;
        let port = listener.local_addr().map_err(PeerError::Io)?.port();
        let mut child = Command::new(&commands.run[0])
            .args(&commands.run[1..])
            .arg(port.to_string())
            .current_dir(&path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(PeerError::Io)?;
        let (tx, rx) = sync_channel(self.config.output_capacity);
        if let Some(stdout) = child.stdout.take() {
            spawn_drain(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_drain(stderr, tx);
        }
        self.output_rx = Some(rx);
        self.child = Some(child);
        let stream = accept_within(&listener, self.config.connect_timeout)?;
        self.attach(stream).map_err(PeerError::Io)?;
        info!("{} connected successfully", self.name);
        Ok(())
    }

    /// Attaches an already-connected peer socket, for transports
    /// established outside [`Peer::start`].
    pub fn attach(&mut self, stream: TcpStream) -> io::Result<()> {
        stream.set_read_timeout(Some(self.config.response_timeout))?;
        stream.set_write_timeout(Some(self.config.response_timeout))?;
        stream.set_nodelay(true)?;
        self.reader = Some(BufReader::new(stream.try_clone()?));
        self.writer = Some(stream);
        Ok(())
    }

    /// Requests one action from the bot.
    ///
    /// The pending clauses in `message` are joined into one line with a
    /// fresh clock clause at the front, and the buffer is truncated so
    /// history is never resent. Every failure mode degrades to the
    /// forced default action: protocol violations are logged and cost
    /// nothing else, while timeouts and I/O errors zero the game clock
    /// and silence the peer for the rest of the match.
    pub fn query(
        &mut self,
        legal: LegalActions,
        bounds: Option<(Chips, Chips)>,
        message: &mut Vec<String>,
        game_log: &mut Vec<String>,
    ) -> Action {
        match self.exchange(message, game_log) {
            Some(response) => match decode_action(&response, legal, bounds) {
                Ok(action) => action,
                Err(error) => {
                    game_log.push(format!("{} {error}", self.name));
                    legal.default_action()
                }
            },
            None => legal.default_action(),
        }
    }

    /// Delivers the round-outcome message and waits for the response,
    /// whose content is ignored.
    pub fn ack(&mut self, message: &mut Vec<String>, game_log: &mut Vec<String>) {
        let _ = self.exchange(message, game_log);
    }

    /// One send/receive over the socket, with clock accounting. Returns
    /// `None` without touching the socket when the peer is unavailable,
    /// and demotes it permanently on timeout or I/O failure.
    fn exchange(
        &mut self,
        message: &mut Vec<String>,
        game_log: &mut Vec<String>,
    ) -> Option<String> {
        if self.writer.is_none() || self.game_clock <= 0.0 {
            return None;
        }
        match self.transmit(message) {
            Ok(response) => Some(response),
            Err(error) => {
                let entry = format!("{} {error}", self.name);
                warn!("{entry}");
                game_log.push(entry);
                self.game_clock = 0.0;
                None
            }
        }
    }

    fn transmit(&mut self, message: &mut Vec<String>) -> Result<String, PeerError> {
        let clock = Clause::Clock(self.game_clock).to_string();
        if message.is_empty() {
            message.push(clock);
        } else {
            message[0] = clock;
        }
        let request = message.join(" ") + "\n";
        message.truncate(1);
        let (Some(writer), Some(reader)) = (self.writer.as_mut(), self.reader.as_mut()) else {
            return Err(PeerError::Io(io::ErrorKind::NotConnected.into()));
        };
        let started = Instant::now();
        writer.write_all(request.as_bytes()).map_err(io_failure)?;
        writer.flush().map_err(io_failure)?;
        let mut response = String::new();
        let read = reader.read_line(&mut response).map_err(io_failure)?;
        if read == 0 {
            return Err(PeerError::Io(io::ErrorKind::UnexpectedEof.into()));
        }
        if self.config.enforce_game_clock {
            self.game_clock -= started.elapsed().as_secs_f64();
        }
        if self.game_clock <= 0.0 {
            // A response landing after the clock is spent is a timeout.
            return Err(PeerError::ClockExhausted);
        }
        Ok(response)
    }

    /// Closes the socket, stops the bot, and writes its captured raw
    /// output to `<name>.txt` under the configured log directory.
    pub fn stop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.write_all(b"Q\n");
            let _ = writer.flush();
            let _ = writer.shutdown(Shutdown::Both);
        }
        self.reader = None;
        if let Some(mut child) = self.child.take() {
            let deadline = Instant::now() + self.config.quit_timeout;
            loop {
                match child.try_wait() {
                    Ok(Some(_)) => break,
                    Ok(None) if Instant::now() < deadline => {
                        thread::sleep(Duration::from_millis(50));
                    }
                    _ => {
                        warn!("timed out waiting for {} to quit", self.name);
                        let _ = child.kill();
                        let _ = child.wait();
                        break;
                    }
                }
            }
        }
        if let Some(rx) = self.output_rx.take() {
            // The drain threads exit once the child's pipes close.
            for line in rx.iter() {
                self.output.push(line);
            }
        }
        if let Err(error) = self.write_output_log() {
            warn!("could not write raw output for {}: {error}", self.name);
        }
    }

    fn write_output_log(&self) -> io::Result<()> {
        let path = self.config.log_dir.join(format!("{}.txt", self.name));
        let mut file = File::create(path)?;
        let mut remaining = self.config.output_limit;
        for line in &self.output {
            let length = line.len() as u64 + 1;
            if length > remaining {
                break;
            }
            file.write_all(line.as_bytes())?;
            file.write_all(b"\n")?;
            remaining -= length;
        }
        Ok(())
    }
}

fn io_failure(error: io::Error) -> PeerError {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => PeerError::ClockExhausted,
        _ => PeerError::Io(error),
    }
}

/// Drains one child pipe into the bounded capture channel so the child
/// can never block on a full pipe. Lines over capacity are dropped.
fn spawn_drain(pipe: impl Read + Send + 'static, tx: SyncSender<String>) {
    thread::spawn(move || {
        for line in BufReader::new(pipe).lines() {
            let Ok(line) = line else {
                break;
            };
            match tx.try_send(line) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
    });
}

fn accept_within(listener: &TcpListener, timeout: Duration) -> Result<TcpStream, PeerError> {
    listener.set_nonblocking(true).map_err(PeerError::Io)?;
    let deadline = Instant::now() + timeout;
    loop {
        match listener.accept() {
            Ok((stream, _)) => {
                stream.set_nonblocking(false).map_err(PeerError::Io)?;
                return Ok(stream);
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(PeerError::ConnectTimeout);
                }
                thread::sleep(Duration::from_millis(25));
            }
            Err(error) => return Err(PeerError::Io(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{BufRead, BufReader, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::game::entities::ActionKind;

    fn bot_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bounty_holdem_peer_{tag}_{}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn setup(game_clock: f64) -> (Peer, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let bot = TcpStream::connect(addr).unwrap();
        let (stream, _) = listener.accept().unwrap();
        let mut peer = Peer::new("test_bot", None, game_clock, PeerConfig::default());
        peer.attach(stream).unwrap();
        (peer, bot)
    }

    fn message() -> Vec<String> {
        vec!["T0.000".to_string(), "P0".to_string(), "HAs,Kd".to_string()]
    }

    fn facing_bet() -> LegalActions {
        LegalActions::new(&[ActionKind::Fold, ActionKind::Call, ActionKind::Raise])
    }

    #[test]
    fn query_round_trips_an_action() {
        let (mut peer, bot) = setup(60.0);
        let scripted = thread::spawn(move || {
            let mut reader = BufReader::new(bot.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            assert!(line.starts_with("T"));
            assert!(line.trim_end().ends_with("HAs,Kd"));
            writeln!(&bot, "R10").unwrap();
        });
        let mut msg = message();
        let mut log = Vec::new();
        let action = peer.query(facing_bet(), Some((4, 400)), &mut msg, &mut log);
        scripted.join().unwrap();
        assert_eq!(action, Action::Raise(10));
        // History was consumed; only the clock placeholder remains.
        assert_eq!(msg.len(), 1);
        assert!(log.is_empty());
        assert!(peer.game_clock > 0.0);
    }

    #[test]
    fn illegal_response_substitutes_the_default() {
        let (mut peer, bot) = setup(60.0);
        let scripted = thread::spawn(move || {
            let mut reader = BufReader::new(bot.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            writeln!(&bot, "K").unwrap();
        });
        let mut msg = message();
        let mut log = Vec::new();
        let action = peer.query(facing_bet(), Some((4, 400)), &mut msg, &mut log);
        scripted.join().unwrap();
        assert_eq!(action, Action::Fold);
        assert_eq!(log.len(), 1);
        assert!(log[0].contains("illegal check"));
        // Protocol violations do not cost the peer its clock.
        assert!(peer.game_clock > 0.0);
    }

    #[test]
    fn misformatted_response_substitutes_the_default() {
        let (mut peer, bot) = setup(60.0);
        let scripted = thread::spawn(move || {
            let mut reader = BufReader::new(bot.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            writeln!(&bot, "banana").unwrap();
        });
        let mut msg = message();
        let mut log = Vec::new();
        let action = peer.query(facing_bet(), Some((4, 400)), &mut msg, &mut log);
        scripted.join().unwrap();
        assert_eq!(action, Action::Fold);
        assert!(log[0].contains("misformatted"));
    }

    #[test]
    fn late_response_counts_as_a_timeout() {
        let (mut peer, bot) = setup(0.05);
        let scripted = thread::spawn(move || {
            let mut reader = BufReader::new(bot.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            thread::sleep(Duration::from_millis(200));
            writeln!(&bot, "C").unwrap();
        });
        let mut msg = message();
        let mut log = Vec::new();
        // The response arrives, but only after the clock is spent: the
        // peer's actual choice must be discarded for the default.
        let action = peer.query(facing_bet(), Some((4, 400)), &mut msg, &mut log);
        scripted.join().unwrap();
        assert_eq!(action, Action::Fold);
        assert_eq!(peer.game_clock, 0.0);
        assert!(log[0].contains("ran out of time"));
    }

    #[test]
    fn exhausted_clock_skips_the_socket_entirely() {
        let (mut peer, _bot) = setup(60.0);
        peer.game_clock = 0.0;
        let mut msg = message();
        let mut log = Vec::new();
        let action = peer.query(LegalActions::check_only(), None, &mut msg, &mut log);
        assert_eq!(action, Action::Check);
        assert!(log.is_empty());
        // Nothing was sent, so the history buffer is untouched.
        assert_eq!(msg.len(), 3);
    }

    #[test]
    fn disconnect_zeroes_the_clock() {
        let (mut peer, bot) = setup(60.0);
        drop(bot);
        let mut msg = message();
        let mut log = Vec::new();
        let action = peer.query(facing_bet(), Some((4, 400)), &mut msg, &mut log);
        assert_eq!(action, Action::Fold);
        assert_eq!(peer.game_clock, 0.0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn commands_file_must_exist() {
        let dir = bot_dir("no_commands");
        assert!(matches!(
            Peer::load_commands(&dir),
            Err(PeerError::BadCommands(_))
        ));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn malformed_commands_json_is_rejected() {
        let dir = bot_dir("bad_json");
        fs::write(dir.join("commands.json"), "run: ./bot").unwrap();
        assert!(matches!(
            Peer::load_commands(&dir),
            Err(PeerError::BadCommands(_))
        ));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn empty_run_command_is_rejected() {
        let dir = bot_dir("empty_run");
        fs::write(dir.join("commands.json"), r#"{"build": [], "run": []}"#).unwrap();
        let error = Peer::load_commands(&dir).unwrap_err();
        assert!(error.to_string().contains("empty run command"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn well_formed_commands_parse() {
        let dir = bot_dir("good_json");
        fs::write(
            dir.join("commands.json"),
            r#"{"build": ["make"], "run": ["./bot", "--fast"]}"#,
        )
        .unwrap();
        let commands = Peer::load_commands(&dir).unwrap();
        assert_eq!(commands.build, vec!["make"]);
        assert_eq!(commands.run, vec!["./bot", "--fast"]);
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn bot_without_a_commands_file_forfeits_on_start() {
        let dir = bot_dir("forfeit_start");
        let mut peer = Peer::new("ghost", Some(dir.clone()), 60.0, PeerConfig::default());
        peer.build();
        peer.start();
        assert_eq!(peer.game_clock, 0.0);
        assert!(peer.writer.is_none());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn raw_output_capture_respects_the_size_limit() {
        let dir = bot_dir("capped_output");
        let config = PeerConfig {
            output_limit: 16,
            log_dir: dir.clone(),
            ..PeerConfig::default()
        };
        let mut peer = Peer::new("capped", None, 60.0, config);
        peer.output = vec!["aaaaaaaaaa".to_string(), "bbbbbbbbbb".to_string()];
        peer.write_output_log().unwrap();
        let captured = fs::read_to_string(dir.join("capped.txt")).unwrap();
        // The second line would overflow the cap, so only the first is
        // kept and the file never exceeds the limit.
        assert_eq!(captured, "aaaaaaaaaa\n");
        assert!(captured.len() as u64 <= 16);
        fs::remove_dir_all(dir).ok();
    }
}
