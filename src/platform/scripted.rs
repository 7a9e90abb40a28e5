//! Scripted in-memory socket
//!
//! Deterministic stand-in for a non-blocking TCP stream: inbound bytes are
//! handed out in configurable chunks, writes follow a plan of per-call
//! budgets, would-blocks and failures, and connect readiness is replayed
//! step by step. Used to drive the framing state machines through
//! arbitrary partial I/O schedules.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use super::socket::{Readiness, Socket};

/// One scripted `write` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    /// Accept at most this many bytes
    Accept(usize),
    /// Report `WouldBlock`
    Block,
    /// Fail with this error kind
    Fail(io::ErrorKind),
}

/// One scripted connect probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    Ready(Readiness),
    /// The poll call itself fails
    PollError(io::ErrorKind),
}

#[derive(Debug, Default)]
pub struct ScriptedSocket {
    inbound: VecDeque<u8>,
    read_chunk: Option<usize>,
    read_faults: VecDeque<io::ErrorKind>,
    eof: bool,
    reads: usize,

    written: Vec<u8>,
    write_plan: VecDeque<WriteStep>,
    write_chunk: Option<usize>,
    writes: usize,

    connect_plan: VecDeque<ConnectStep>,
    nodelay: bool,
}

impl ScriptedSocket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Socket whose peer already sent `bytes`
    pub fn with_inbound(bytes: &[u8]) -> Self {
        let mut socket = Self::new();
        socket.push_inbound(bytes);
        socket
    }

    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend(bytes.iter().copied());
    }

    /// Peer shut down its side: reads return 0 once inbound data is drained.
    pub fn close_inbound(&mut self) {
        self.eof = true;
    }

    /// Limit every read to `n` bytes.
    pub fn set_read_chunk(&mut self, n: usize) {
        self.read_chunk = Some(n);
    }

    /// Next read fails with `kind`, whatever data is pending.
    pub fn fail_next_read(&mut self, kind: io::ErrorKind) {
        self.read_faults.push_back(kind);
    }

    /// Limit every unscripted write to `n` bytes.
    pub fn set_write_chunk(&mut self, n: usize) {
        self.write_chunk = Some(n);
    }

    /// Append write steps; once exhausted, writes accept everything
    /// (subject to the write chunk).
    pub fn plan_writes<I: IntoIterator<Item = WriteStep>>(&mut self, steps: I) {
        self.write_plan.extend(steps);
    }

    /// Append connect probe results; once exhausted, probes stay pending.
    pub fn plan_connect<I: IntoIterator<Item = ConnectStep>>(&mut self, steps: I) {
        self.connect_plan.extend(steps);
    }

    /// Bytes written so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Inbound bytes not yet read
    pub fn unread(&self) -> usize {
        self.inbound.len()
    }

    /// Number of `read` calls seen
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of `write` calls seen
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn nodelay(&self) -> bool {
        self.nodelay
    }
}

impl Read for ScriptedSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;

        if let Some(kind) = self.read_faults.pop_front() {
            return Err(io::Error::from(kind));
        }
        if self.inbound.is_empty() {
            return if self.eof {
                Ok(0)
            } else {
                Err(io::Error::from(io::ErrorKind::WouldBlock))
            };
        }

        let limit = self.read_chunk.unwrap_or(usize::MAX);
        let n = buf.len().min(self.inbound.len()).min(limit);
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for ScriptedSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;

        let budget = match self.write_plan.pop_front() {
            Some(WriteStep::Accept(n)) => n,
            Some(WriteStep::Block) => return Err(io::Error::from(io::ErrorKind::WouldBlock)),
            Some(WriteStep::Fail(kind)) => return Err(io::Error::from(kind)),
            None => usize::MAX,
        };

        let limit = self.write_chunk.unwrap_or(usize::MAX);
        let n = buf.len().min(budget).min(limit);
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Socket for ScriptedSocket {
    fn connect(_addr: SocketAddr) -> io::Result<Self> {
        Ok(Self::new())
    }

    fn poll_connect(&mut self) -> io::Result<Readiness> {
        match self.connect_plan.pop_front() {
            Some(ConnectStep::Ready(readiness)) => Ok(readiness),
            Some(ConnectStep::PollError(kind)) => Err(io::Error::from(kind)),
            None => Ok(Readiness::Pending),
        }
    }

    fn set_nodelay(&mut self, nodelay: bool) -> io::Result<()> {
        self.nodelay = nodelay;
        Ok(())
    }
}
