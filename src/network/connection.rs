//! Outbound connection establishment
//!
//! Issues a non-blocking connect, then probes the socket once per tick
//! until it is writable or reports an error. No retries and no timeout:
//! a connect that never resolves stays pending until the caller gives up.

use std::net::{IpAddr, SocketAddr};

use crate::error::{Error, Result};
use crate::platform::{is_transient, Readiness, Socket};

use super::event::ConnectionOutcome;

/// Drives one outbound connect to completion
#[derive(Debug, Default)]
pub struct ConnectionHandler {
    target: Option<SocketAddr>,
}

impl ConnectionHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a non-blocking connect to `address:port`.
    ///
    /// `address` must be an IP literal. "In progress" is not an error; the
    /// returned socket is polled with [`ready`](Self::ready).
    pub fn connect<S: Socket>(&mut self, address: &str, port: u16) -> Result<S> {
        let ip: IpAddr = address
            .parse()
            .map_err(|_| Error::InvalidAddress(address.to_string()))?;
        let target = SocketAddr::new(ip, port);
        self.target = Some(target);

        let socket = S::connect(target)?;
        log::debug!("connect to {} in progress", target);
        Ok(socket)
    }

    /// Zero-timeout probe: `None` while the connect is still in flight.
    pub fn ready<S: Socket>(&mut self, socket: &mut S) -> Option<ConnectionOutcome> {
        match socket.poll_connect() {
            Ok(Readiness::Pending) => None,
            Ok(Readiness::Connected) => {
                log::debug!("connected to {}", self.peer_label());
                Some(ConnectionOutcome::Succeeded)
            }
            Ok(Readiness::Failed) => {
                log::warn!("connect to {} failed", self.peer_label());
                Some(ConnectionOutcome::Failed)
            }
            Err(ref e) if is_transient(e) => None,
            Err(e) => {
                log::warn!("connect poll for {} failed: {}", self.peer_label(), e);
                Some(ConnectionOutcome::Failed)
            }
        }
    }

    /// Address of the last connect attempt
    pub fn target(&self) -> Option<SocketAddr> {
        self.target
    }

    /// `address:port` of the target, for log lines
    fn peer_label(&self) -> String {
        self.target
            .map_or_else(|| String::from("<no target>"), |addr| addr.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ConnectStep, ScriptedSocket};
    use std::io;

    #[test]
    fn test_invalid_address() {
        let mut handler = ConnectionHandler::new();
        let err = handler
            .connect::<ScriptedSocket>("not-an-ip", 11000)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(ref a) if a == "not-an-ip"));
        assert_eq!(handler.target(), None);
        assert_eq!(handler.peer_label(), "<no target>");
    }

    #[test]
    fn test_ready_transitions() {
        let mut handler = ConnectionHandler::new();
        let mut socket: ScriptedSocket = handler.connect("127.0.0.1", 11000).unwrap();
        assert_eq!(handler.target(), Some("127.0.0.1:11000".parse().unwrap()));
        assert_eq!(handler.peer_label(), "127.0.0.1:11000");

        socket.plan_connect([
            ConnectStep::Ready(Readiness::Pending),
            ConnectStep::PollError(io::ErrorKind::Interrupted),
            ConnectStep::Ready(Readiness::Connected),
        ]);

        assert_eq!(handler.ready(&mut socket), None);
        assert_eq!(handler.ready(&mut socket), None);
        assert_eq!(
            handler.ready(&mut socket),
            Some(ConnectionOutcome::Succeeded)
        );
    }

    #[test]
    fn test_ready_failures() {
        let mut handler = ConnectionHandler::new();
        let mut socket: ScriptedSocket = handler.connect("::1", 4000).unwrap();
        assert_eq!(handler.peer_label(), "[::1]:4000");

        socket.plan_connect([
            ConnectStep::Ready(Readiness::Failed),
            ConnectStep::PollError(io::ErrorKind::Other),
        ]);

        assert_eq!(handler.ready(&mut socket), Some(ConnectionOutcome::Failed));
        assert_eq!(handler.ready(&mut socket), Some(ConnectionOutcome::Failed));
    }

    #[test]
    fn test_unresolved_connect_stays_pending() {
        let mut handler = ConnectionHandler::new();
        let mut socket: ScriptedSocket = handler.connect("10.0.0.1", 1).unwrap();
        for _ in 0..100 {
            assert_eq!(handler.ready(&mut socket), None);
        }
    }
}
