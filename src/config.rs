//! Transport configuration
//!
//! Plain structs with sensible defaults. Binaries fill them from the
//! command line; library users build them directly.

use std::num::NonZeroUsize;

/// Port of the reference deployment
pub const DEFAULT_PORT: u16 = 11000;

/// Default listen backlog
pub const DEFAULT_BACKLOG: i32 = 128;

/// Default number of connections accepted per `Server::process` tick
pub const DEFAULT_ACCEPT_BURST: usize = 64;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listening port on all local interfaces (0 lets the OS pick)
    pub port: u16,
    /// `listen(2)` backlog
    pub backlog: i32,
    /// Upper bound on accepts per tick. `None` drains the accept queue until
    /// it would block, which lets a connection flood starve session I/O.
    pub accept_burst: Option<NonZeroUsize>,
    /// Disable Nagle's algorithm on accepted sockets
    pub nodelay: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            accept_burst: NonZeroUsize::new(DEFAULT_ACCEPT_BURST),
            nodelay: true,
        }
    }
}

impl ServerConfig {
    /// Default configuration listening on `port`
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Disable Nagle's algorithm once connected
    pub nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { nodelay: true }
    }
}
