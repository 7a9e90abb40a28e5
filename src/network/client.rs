//! Peer session: connect, framed send/receive, disconnect
//!
//! One socket, one send queue, one reassembly buffer and a three-state
//! lifecycle. `process` is called every tick and yields at most one event.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::platform::{Socket, TcpSocket};
use crate::protocol::PacketUnit;

use super::connection::ConnectionHandler;
use super::event::{ConnectionOutcome, DisconnectReason, Event};
use super::reception::ReceptionHandler;
use super::sending::SendingHandler;
use super::session::{SessionId, SessionState};

/// A peer session, outbound (`connect`) or adopted (`initialize`)
pub struct Client<U: PacketUnit = u8, S: Socket = TcpSocket> {
    id: SessionId,
    config: ClientConfig,
    connection: ConnectionHandler,
    sending: SendingHandler<U>,
    reception: ReceptionHandler<U>,
    socket: Option<S>,
    state: SessionState,
}

impl<U: PacketUnit, S: Socket> Default for Client<U, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: PacketUnit, S: Socket> Client<U, S> {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self {
            id: SessionId::next(),
            config,
            connection: ConnectionHandler::new(),
            sending: SendingHandler::new(),
            reception: ReceptionHandler::new(),
            socket: None,
            state: SessionState::Disconnected,
        }
    }

    /// Id of the current (or last) session
    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    /// Adopt an already connected socket (server side). Skips `Connecting`.
    pub fn initialize(&mut self, mut socket: S) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(Error::SessionActive);
        }
        if self.config.nodelay {
            socket.set_nodelay(true)?;
        }

        self.id = SessionId::next();
        self.socket = Some(socket);
        self.start_exchange();
        log::debug!("[{}] session initialised", self.id);
        Ok(())
    }

    /// Start a non-blocking connect. Completion is reported by `process`.
    pub fn connect(&mut self, address: &str, port: u16) -> Result<()> {
        if self.state != SessionState::Disconnected {
            return Err(Error::SessionActive);
        }

        let socket = self.connection.connect::<S>(address, port)?;
        self.id = SessionId::next();
        self.socket = Some(socket);
        self.state = SessionState::Connecting;
        log::info!("[{}] connecting to {}:{}", self.id, address, port);
        Ok(())
    }

    /// Close the socket now, dropping queued and partial frames.
    pub fn disconnect(&mut self) {
        if self.socket.take().is_some() {
            log::debug!(
                "[{}] closing socket ({} bytes unsent, partial frame: {})",
                self.id,
                self.sending.queue_size(),
                self.reception.is_mid_frame()
            );
        }
        self.sending.clear();
        self.reception.reset();
        self.state = SessionState::Disconnected;
    }

    /// Queue a payload. Valid in any state; flushed once connected.
    #[inline]
    pub fn send(&mut self, payload: &[U]) -> Result<()> {
        self.sending.enqueue(payload)
    }

    /// Wire bytes waiting to be written
    #[inline]
    pub fn queue_size(&self) -> usize {
        self.sending.queue_size()
    }

    /// Drive I/O for this tick.
    pub fn process(&mut self) -> Option<Event<U>> {
        match self.state {
            SessionState::Connecting => {
                let Some(socket) = self.socket.as_mut() else {
                    self.disconnect();
                    return Some(Event::Connection(ConnectionOutcome::Failed));
                };

                let outcome = self.connection.ready(socket)?;
                match outcome {
                    ConnectionOutcome::Succeeded => {
                        if self.config.nodelay {
                            if let Err(e) = socket.set_nodelay(true) {
                                log::debug!("[{}] TCP_NODELAY not applied: {}", self.id, e);
                            }
                        }
                        self.start_exchange();
                        log::info!("[{}] connected", self.id);
                    }
                    ConnectionOutcome::Failed => {
                        log::warn!("[{}] connection failed", self.id);
                        self.disconnect();
                    }
                }
                Some(Event::Connection(outcome))
            }
            SessionState::Connected => {
                let Some(socket) = self.socket.as_mut() else {
                    self.disconnect();
                    return Some(Event::Disconnection(DisconnectReason::Lost));
                };

                if let Err(e) = self.sending.send(socket) {
                    log::warn!("[{}] send failed: {}", self.id, e);
                    self.disconnect();
                    return Some(Event::Disconnection(DisconnectReason::Lost));
                }

                let event = self.reception.receive(socket);
                if let Some(Event::Disconnection(reason)) = &event {
                    log::info!("[{}] disconnected: {}", self.id, reason);
                    self.disconnect();
                }
                event
            }
            SessionState::Disconnected => None,
        }
    }

    /// Underlying socket while a session is alive
    pub fn socket(&self) -> Option<&S> {
        self.socket.as_ref()
    }

    pub fn socket_mut(&mut self) -> Option<&mut S> {
        self.socket.as_mut()
    }

    fn start_exchange(&mut self) {
        self.sending.reset();
        self.reception.reset();
        self.state = SessionState::Connected;
    }
}

impl<U: PacketUnit, S: Socket> Drop for Client<U, S> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{ConnectStep, Readiness, ScriptedSocket, WriteStep};
    use crate::protocol::{encode_frame, MAX_PAYLOAD_LEN};
    use pretty_assertions::assert_eq;
    use std::io;

    type TestClient = Client<u8, ScriptedSocket>;

    fn connected(inbound: &[u8]) -> TestClient {
        let mut client = TestClient::new();
        client
            .initialize(ScriptedSocket::with_inbound(inbound))
            .unwrap();
        client
    }

    #[test]
    fn test_initialize_skips_connecting() {
        let client = connected(&[]);
        assert_eq!(client.state(), SessionState::Connected);
        assert!(client.socket().unwrap().nodelay());
    }

    #[test]
    fn test_initialize_twice_rejected() {
        let mut client = connected(&[]);
        let id = client.id();
        assert!(matches!(
            client.initialize(ScriptedSocket::new()),
            Err(Error::SessionActive)
        ));
        assert_eq!(client.id(), id);
    }

    #[test]
    fn test_new_session_gets_new_id() {
        let mut client = connected(&[]);
        let first = client.id();
        client.disconnect();
        client.initialize(ScriptedSocket::new()).unwrap();
        assert_ne!(client.id(), first);
    }

    #[test]
    fn test_connect_success_flushes_queued_payloads() {
        let mut client = TestClient::new();
        client.send(b"early").unwrap();
        client.connect("127.0.0.1", 11000).unwrap();
        assert_eq!(client.state(), SessionState::Connecting);

        client.send(b"later").unwrap();
        client.socket_mut().unwrap().plan_connect([
            ConnectStep::Ready(Readiness::Pending),
            ConnectStep::Ready(Readiness::Connected),
        ]);

        assert_eq!(client.process(), None);
        assert_eq!(
            client.process(),
            Some(Event::Connection(ConnectionOutcome::Succeeded))
        );
        // Nothing written while connecting
        assert!(client.socket().unwrap().written().is_empty());

        assert_eq!(client.process(), None);
        let mut expected = encode_frame(b"early".as_slice()).unwrap();
        expected.extend(encode_frame(b"later".as_slice()).unwrap());
        assert_eq!(client.socket().unwrap().written(), expected.as_slice());
    }

    #[test]
    fn test_connect_failure() {
        let mut client = TestClient::new();
        client.connect("127.0.0.1", 11000).unwrap();
        client
            .socket_mut()
            .unwrap()
            .plan_connect([ConnectStep::Ready(Readiness::Failed)]);

        assert_eq!(
            client.process(),
            Some(Event::Connection(ConnectionOutcome::Failed))
        );
        assert_eq!(client.state(), SessionState::Disconnected);
        assert!(client.socket().is_none());
        assert_eq!(client.process(), None);
    }

    #[test]
    fn test_connect_while_active_rejected() {
        let mut client = TestClient::new();
        client.connect("127.0.0.1", 11000).unwrap();
        assert!(matches!(
            client.connect("127.0.0.1", 11000),
            Err(Error::SessionActive)
        ));
    }

    #[test]
    fn test_receive_payload_then_peer_close() {
        let mut client = connected(&encode_frame(&[3u8, 3, 1]).unwrap());
        assert_eq!(client.process(), Some(Event::Payload(vec![3, 3, 1])));
        assert_eq!(client.process(), None);

        client.socket_mut().unwrap().close_inbound();
        assert_eq!(
            client.process(),
            Some(Event::Disconnection(DisconnectReason::PeerClosed))
        );
        assert_eq!(client.state(), SessionState::Disconnected);
        assert_eq!(client.process(), None);
    }

    #[test]
    fn test_read_error_is_lost() {
        let mut client = connected(&[]);
        client
            .socket_mut()
            .unwrap()
            .fail_next_read(io::ErrorKind::ConnectionReset);
        assert_eq!(
            client.process(),
            Some(Event::Disconnection(DisconnectReason::Lost))
        );
        assert!(!client.is_connected());
    }

    #[test]
    fn test_write_error_is_lost() {
        let mut client = connected(&[]);
        client.send(b"doomed").unwrap();
        client
            .socket_mut()
            .unwrap()
            .plan_writes([WriteStep::Fail(io::ErrorKind::BrokenPipe)]);

        assert_eq!(
            client.process(),
            Some(Event::Disconnection(DisconnectReason::Lost))
        );
        assert_eq!(client.queue_size(), 0);
    }

    #[test]
    fn test_oversized_send_rejected() {
        let mut client = connected(&[]);
        assert!(client.send(&vec![0u8; MAX_PAYLOAD_LEN + 1]).is_err());
        assert_eq!(client.queue_size(), 0);
        assert!(client.is_connected());
    }

    #[test]
    fn test_disconnect_discards_everything() {
        let mut client = connected(&encode_frame(&[1u8, 2, 3]).unwrap()[..3]);
        client.send(b"pending").unwrap();
        client
            .socket_mut()
            .unwrap()
            .plan_writes([WriteStep::Accept(3), WriteStep::Block]);

        assert_eq!(client.process(), None);
        assert!(client.queue_size() > 0);

        client.disconnect();
        assert_eq!(client.state(), SessionState::Disconnected);
        assert_eq!(client.queue_size(), 0);
        assert!(client.socket().is_none());
    }
}
