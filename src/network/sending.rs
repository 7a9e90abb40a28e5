//! Outbound framing with resumable partial writes
//!
//! Payloads wait in a FIFO queue. `send` frames the front payload as
//! header + body and writes as much as the socket takes; whatever is left
//! stays in the in-flight buffer for the next tick, byte-exact.

use std::collections::VecDeque;
use std::io::{self, Write};

use crate::error::{Error, Result};
use crate::protocol::{encode_units, FrameHeader, PacketUnit, HEADER_SIZE, MAX_PAYLOAD_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing in flight
    Idle,
    /// Writing the length prefix of the queue front
    Header,
    /// Writing the body of the payload just popped
    Body,
}

/// Send side of one session
#[derive(Debug)]
pub struct SendingHandler<U: PacketUnit = u8> {
    queue: VecDeque<(FrameHeader, Vec<U>)>,
    buffer: Vec<u8>,
    written: usize,
    state: State,
}

impl<U: PacketUnit> Default for SendingHandler<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U: PacketUnit> SendingHandler<U> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            buffer: Vec::new(),
            written: 0,
            state: State::Idle,
        }
    }

    /// Queue a payload. Pure buffering, never touches the socket.
    ///
    /// Fails without changing anything when the payload does not fit the
    /// frame header.
    pub fn enqueue(&mut self, payload: &[U]) -> Result<()> {
        let header = FrameHeader::for_payload(payload.len()).ok_or(Error::PayloadTooLarge {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        })?;

        self.queue.push_back((header, payload.to_vec()));
        log::trace!(
            "queued payload of {} units ({} frames pending)",
            payload.len(),
            self.queue.len()
        );
        Ok(())
    }

    /// Write queued frames until the socket would block or the queue drains.
    ///
    /// Would-block is not an error. Any other write error is returned and
    /// ends the session.
    pub fn send<W: Write>(&mut self, socket: &mut W) -> io::Result<()> {
        if self.state == State::Idle && !self.queue.is_empty() {
            self.prepare_header();
        }

        while self.state != State::Idle && self.flush_buffer(socket)? {
            match self.state {
                State::Header => self.prepare_body(),
                _ => {
                    if self.queue.is_empty() {
                        self.state = State::Idle;
                    } else {
                        self.prepare_header();
                    }
                }
            }
        }
        Ok(())
    }

    /// Wire bytes still to be written: every queued frame (header and body)
    /// plus the unsent part of the in-flight buffer.
    pub fn queue_size(&self) -> usize {
        let queued: usize = self
            .queue
            .iter()
            .map(|(header, _)| header.total_size::<U>())
            .sum();
        let in_flight = self.buffer.len() - self.written;

        match self.state {
            State::Idle => queued,
            // Front payload is still queued; its header is the in-flight buffer
            State::Header => queued - HEADER_SIZE + in_flight,
            State::Body => queued + in_flight,
        }
    }

    /// Frames not completely written yet
    pub fn pending_frames(&self) -> usize {
        self.queue.len() + usize::from(self.state == State::Body)
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle && self.queue.is_empty()
    }

    /// Drop the in-flight buffer, keep queued payloads.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.written = 0;
        self.state = State::Idle;
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.reset();
        self.queue.clear();
    }

    /// Returns `true` once the whole buffer is written.
    fn flush_buffer<W: Write>(&mut self, socket: &mut W) -> io::Result<bool> {
        while self.written < self.buffer.len() {
            match socket.write(&self.buffer[self.written..]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write frame to socket",
                    ));
                }
                Ok(n) => {
                    self.written += n;
                    log::trace!("wrote {} bytes ({}/{})", n, self.written, self.buffer.len());
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    fn prepare_header(&mut self) {
        self.buffer.clear();
        if let Some((header, _)) = self.queue.front() {
            self.buffer.extend_from_slice(&header.encode());
        }
        self.written = 0;
        self.state = State::Header;
    }

    fn prepare_body(&mut self) {
        self.buffer.clear();
        if let Some((_, payload)) = self.queue.pop_front() {
            encode_units(&payload, &mut self.buffer);
        }
        self.written = 0;
        self.state = State::Body;
    }
}
