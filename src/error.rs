//! Error types for peerwire.
//!
//! Session-fatal socket conditions are not errors: they surface as
//! [`Event::Disconnection`](crate::Event::Disconnection) or a failed
//! [`Event::Connection`](crate::Event::Connection). This type covers caller
//! misuse and startup failures.

use thiserror::Error;

use crate::network::SessionId;

/// Main error type for all peerwire operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Socket creation, bind, listen or connect rejected by the OS.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload longer than the frame header can describe.
    #[error("payload of {len} units exceeds the frame limit of {max}")]
    PayloadTooLarge { len: usize, max: usize },

    /// Remote address is not an IP literal.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// `connect`/`initialize` called on a session that is not disconnected.
    #[error("session is already active")]
    SessionActive,

    /// No registered session with this id.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// Server used before a successful `startup`.
    #[error("server is not running")]
    NotRunning,
}

/// Result type alias using peerwire's Error.
pub type Result<T> = std::result::Result<T, Error>;
