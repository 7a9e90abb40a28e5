//! Peerwire - Non-Blocking Peer-to-Peer TCP Transport
//!
//! Arsitektur:
//! - Framing: 16-bit length prefix (network order) + body of fixed-width units
//! - Non-blocking: every call returns immediately, the caller polls each tick
//! - Resumable I/O: partial reads and writes continue byte-exact next tick
//! - Sessions: one [`Client`] per peer, a [`Server`] multiplexes many
//!
//! ```no_run
//! use peerwire::{Event, NetworkContext, Server, ServerConfig};
//!
//! let _network = NetworkContext::startup()?;
//! let mut server: Server = Server::new(ServerConfig::default());
//! server.startup(server.config().port)?;
//!
//! loop {
//!     for (id, event) in server.process() {
//!         if let Event::Payload(data) = event {
//!             server.send(id, &data)?;
//!         }
//!     }
//! }
//! # Ok::<(), peerwire::Error>(())
//! ```
//!
//! No timeouts exist anywhere: a connect that never resolves stays in
//! `Connecting`, and a peer that stops reading leaves frames queued.
//! Applications needing either must track time themselves and call
//! `disconnect`.

pub mod config;
pub mod error;
pub mod network;
pub mod platform;
pub mod protocol;

pub use config::{ClientConfig, ServerConfig, DEFAULT_PORT};
pub use error::{Error, Result};
pub use network::{
    Client, ConnectionOutcome, DisconnectReason, Event, Events, Server, SessionId, SessionState,
};
pub use platform::{NetworkContext, Socket, TcpSocket};
pub use protocol::{PacketUnit, MAX_PAYLOAD_LEN};
