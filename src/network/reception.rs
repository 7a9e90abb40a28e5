//! Inbound frame reassembly with resumable partial reads
//!
//! Collects the fixed-size header, then exactly the declared body. Nothing
//! reaches the caller before the whole body is in.

use std::io::{self, Read};
use std::marker::PhantomData;

use crate::protocol::{decode_units, FrameHeader, PacketUnit, HEADER_SIZE};

use super::event::{DisconnectReason, Event};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    Body,
}

/// Receive side of one session
#[derive(Debug)]
pub struct ReceptionHandler<U: PacketUnit = u8> {
    buffer: Vec<u8>,
    received: usize,
    state: State,
    _unit: PhantomData<U>,
}

impl<U: PacketUnit> Default for ReceptionHandler<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: PacketUnit> ReceptionHandler<U> {
    pub fn new() -> Self {
        let mut handler = Self {
            buffer: Vec::with_capacity(HEADER_SIZE),
            received: 0,
            state: State::Header,
            _unit: PhantomData,
        };
        handler.prepare_header();
        handler
    }

    /// One non-blocking read into the current buffer.
    ///
    /// Completing a header immediately tries the body, since its bytes may
    /// already be in the kernel buffer. Returns at most one event: a whole
    /// payload, or a disconnection. `None` means "nothing yet".
    pub fn receive<R: Read>(&mut self, socket: &mut R) -> Option<Event<U>> {
        loop {
            match socket.read(&mut self.buffer[self.received..]) {
                Ok(0) => {
                    log::debug!("peer closed the connection");
                    return Some(Event::Disconnection(DisconnectReason::PeerClosed));
                }
                Ok(n) => {
                    self.received += n;
                    log::trace!("read {} bytes ({}/{})", n, self.received, self.buffer.len());
                    if self.received < self.buffer.len() {
                        return None;
                    }

                    match self.state {
                        State::Header => {
                            self.prepare_body();
                            // Empty body: nothing to read, and a zero-length
                            // read would look like an orderly shutdown
                            if self.buffer.is_empty() {
                                return Some(self.complete_body());
                            }
                        }
                        State::Body => return Some(self.complete_body()),
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return None,
                Err(e) => {
                    log::debug!("read failed: {}", e);
                    return Some(Event::Disconnection(DisconnectReason::Lost));
                }
            }
        }
    }

    /// Whether part of a frame has been received
    pub fn is_mid_frame(&self) -> bool {
        self.state == State::Body || self.received > 0
    }

    /// Discard any partial frame.
    pub fn reset(&mut self) {
        self.prepare_header();
    }

    fn prepare_header(&mut self) {
        self.prepare(HEADER_SIZE, State::Header);
    }

    fn prepare_body(&mut self) {
        let mut raw = [0u8; HEADER_SIZE];
        raw.copy_from_slice(&self.buffer[..HEADER_SIZE]);
        let header = FrameHeader::decode(raw);
        self.prepare(header.body_bytes::<U>(), State::Body);
    }

    fn prepare(&mut self, len: usize, state: State) {
        self.buffer.clear();
        self.buffer.resize(len, 0);
        self.received = 0;
        self.state = state;
    }

    fn complete_body(&mut self) -> Event<U> {
        let units = decode_units::<U>(&self.buffer);
        self.prepare_header();
        Event::Payload(units)
    }
}
