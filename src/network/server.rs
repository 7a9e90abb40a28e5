//! Peer server: accept loop and session registry
//!
//! Cooperative, single-threaded: every `process` tick drives each session
//! once, then accepts new connections. No background threads, no locks.

use std::collections::BTreeMap;
use std::io;
use std::net::SocketAddr;
use std::num::NonZeroUsize;

use mio::net::TcpListener;

use crate::config::{ClientConfig, ServerConfig};
use crate::error::{Error, Result};
use crate::platform::{self, TcpSocket};
use crate::protocol::PacketUnit;

use super::client::Client;
use super::event::{ConnectionOutcome, Event};
use super::session::SessionId;

/// Events produced by one tick, at most one per session
pub type Events<U> = BTreeMap<SessionId, Event<U>>;

/// Multiplexes inbound sessions behind session ids
pub struct Server<U: PacketUnit = u8> {
    config: ServerConfig,
    listener: Option<TcpListener>,
    sessions: BTreeMap<SessionId, Client<U, TcpSocket>>,
}

impl<U: PacketUnit> Default for Server<U> {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

impl<U: PacketUnit> Server<U> {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            listener: None,
            sessions: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Listen on `0.0.0.0:port`. A running server is shut down first.
    ///
    /// On failure the server stays stopped; `process` yields nothing.
    pub fn startup(&mut self, port: u16) -> Result<()> {
        if self.listener.is_some() {
            self.shutdown();
        }

        let listener = platform::listen(port, self.config.backlog).map_err(|e| {
            log::warn!("listen on port {} failed: {}", port, e);
            e
        })?;
        let listener = TcpListener::from_std(listener);
        log::info!("listening on {}", listener.local_addr()?);

        self.listener = Some(listener);
        Ok(())
    }

    /// Disconnect every session and close the listener.
    pub fn shutdown(&mut self) {
        for session in self.sessions.values_mut() {
            session.disconnect();
        }
        self.sessions.clear();
        if self.listener.take().is_some() {
            log::info!("server stopped");
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.listener.is_some()
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        let listener = self.listener.as_ref().ok_or(Error::NotRunning)?;
        Ok(listener.local_addr()?)
    }

    /// One tick: drive every session, then accept new connections.
    pub fn process(&mut self) -> Events<U> {
        let mut events = Events::new();
        self.process_into(&mut events);
        events
    }

    /// Same as [`process`](Self::process), writing into `events`.
    ///
    /// Replaces the contents: events left over from an earlier tick are
    /// cleared, since a later event for the same session would overwrite
    /// them anyway.
    pub fn process_into(&mut self, events: &mut Events<U>) {
        events.clear();
        if self.listener.is_none() {
            return;
        }

        // === PHASE 1: Session I/O ===
        self.sessions.retain(|&id, session| match session.process() {
            Some(event) => {
                let alive = !event.is_disconnection();
                if !alive {
                    log::info!("[{}] session removed: {}", id, event);
                }
                events.insert(id, event);
                alive
            }
            None => true,
        });

        // === PHASE 2: Accept new connections ===
        self.accept_connections(events);
    }

    /// Queue a payload for one session.
    pub fn send(&mut self, id: SessionId, payload: &[U]) -> Result<()> {
        self.sessions
            .get_mut(&id)
            .ok_or(Error::UnknownSession(id))?
            .send(payload)
    }

    /// Queue a payload for every session. Every session is attempted; the
    /// call fails if any enqueue failed.
    pub fn broadcast(&mut self, payload: &[U]) -> Result<()> {
        let mut result = Ok(());
        for session in self.sessions.values_mut() {
            if let Err(e) = session.send(payload) {
                result = Err(e);
            }
        }
        result
    }

    /// Drop one session immediately. No event is produced for it.
    pub fn disconnect(&mut self, id: SessionId) -> Result<()> {
        let mut session = self
            .sessions
            .remove(&id)
            .ok_or(Error::UnknownSession(id))?;
        session.disconnect();
        log::info!("[{}] session dropped by server", id);
        Ok(())
    }

    pub fn session_ids(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.sessions.keys().copied()
    }

    #[inline]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Wire bytes queued for one session
    pub fn queue_size(&self, id: SessionId) -> Option<usize> {
        self.sessions.get(&id).map(Client::queue_size)
    }

    fn accept_connections(&mut self, events: &mut Events<U>) {
        let Some(listener) = self.listener.as_ref() else {
            return;
        };

        let limit = self.config.accept_burst.map_or(usize::MAX, NonZeroUsize::get);
        let mut accepted = 0;
        while accepted < limit {
            match listener.accept() {
                Ok((stream, addr)) => {
                    accepted += 1;

                    let mut session = Client::with_config(ClientConfig {
                        nodelay: self.config.nodelay,
                    });
                    match session.initialize(TcpSocket::accepted(stream)) {
                        Ok(()) => {
                            let id = session.id();
                            log::info!("[{}] connected: {}", id, addr);
                            events.insert(id, Event::Connection(ConnectionOutcome::Succeeded));
                            self.sessions.insert(id, session);
                        }
                        Err(e) => log::warn!("failed to set up session for {}: {}", addr, e),
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::warn!("accept error: {}", e);
                    break;
                }
            }
        }

        if accepted == limit {
            log::debug!("accept burst of {} reached, rest deferred to next tick", limit);
        }
    }
}

impl<U: PacketUnit> Drop for Server<U> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
