//! A minimal bot: checks when it can, calls when it must.
//!
//! Run with the port the engine is listening on, the same way the
//! engine invokes a `commands.json` run command:
//!
//! ```sh
//! cargo run --example call_bot -- 6969
//! ```

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

fn main() -> std::io::Result<()> {
    let port = std::env::args()
        .nth(1)
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or_else(|| {
            eprintln!("usage: call_bot <port>");
            std::process::exit(1);
        });
    let stream = TcpStream::connect(("127.0.0.1", port))?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let clauses: Vec<&str> = line.split_whitespace().collect();
        if clauses.iter().any(|c| *c == "Q") {
            return Ok(());
        }
        // Call when facing a raise, complete the blind on the first
        // small-blind query of a round, and check everything else.
        let fresh_deal = clauses.iter().any(|c| c.starts_with('H'));
        let small_blind = clauses.iter().any(|c| *c == "P0");
        let response = match clauses.last() {
            Some(last) if last.starts_with('R') => "C",
            Some(last) if last.starts_with('G') && fresh_deal && small_blind => "C",
            _ => "K",
        };
        writeln!(&stream, "{response}")?;
    }
}
