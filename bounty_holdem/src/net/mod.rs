//! Line-based peer protocol and bot process management.
//!
//! The engine speaks to each bot over a plain TCP socket: one
//! space-separated line of clauses per decision point, one action token
//! back. [`messages`] defines the clause grammar, [`peer`] owns the
//! subprocess and socket lifecycle, and [`errors`] distinguishes
//! protocol violations (forgiven with a forced default) from transport
//! failures (which silence the peer for the rest of the match).

pub mod errors;
pub mod messages;
pub mod peer;

pub use errors::{PeerError, ProtocolError};
pub use messages::{Clause, decode_action};
pub use peer::{Peer, PeerConfig};
