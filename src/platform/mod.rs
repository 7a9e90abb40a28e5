//! Platform Layer: Socket Capability
//!
//! Everything the transport needs from the OS, behind a small surface:
//! - Non-blocking stream sockets ([`Socket`], [`TcpSocket`])
//! - Listening socket creation with address reuse ([`listen`])
//! - Process-wide network stack lifecycle ([`NetworkContext`])
//! - A scripted in-memory socket for deterministic partial I/O (tests and
//!   the `scripted` feature only)

mod context;
mod listener;
#[cfg(any(test, feature = "scripted"))]
mod scripted;
mod socket;

pub use context::NetworkContext;
pub use listener::listen;
#[cfg(any(test, feature = "scripted"))]
pub use scripted::{ConnectStep, ScriptedSocket, WriteStep};
pub use socket::{is_transient, Readiness, Socket, TcpSocket};
