//! Network Layer: Sessions over Non-Blocking TCP
//!
//! Cooperative polling, no threads:
//! - [`ConnectionHandler`]: outbound non-blocking connect
//! - [`SendingHandler`] / [`ReceptionHandler`]: framing with resumable partial I/O
//! - [`Client`]: one session and its lifecycle
//! - [`Server`]: accept loop plus registry of sessions by [`SessionId`]

mod client;
mod connection;
mod event;
mod reception;
mod sending;
mod server;
mod session;

pub use client::Client;
pub use connection::ConnectionHandler;
pub use event::{ConnectionOutcome, DisconnectReason, Event};
pub use reception::ReceptionHandler;
pub use sending::SendingHandler;
pub use server::{Events, Server};
pub use session::{SessionId, SessionState};
