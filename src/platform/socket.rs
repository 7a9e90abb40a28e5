//! Socket capability used by the transport core
//!
//! The handlers only need `Read`/`Write` plus a zero-timeout writability
//! probe while an outbound connect is in flight. [`TcpSocket`] provides
//! that over a mio stream; tests substitute a scripted socket.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::time::Duration;

use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};

const CONNECT_TOKEN: Token = Token(0);
const PROBE_EVENTS_CAPACITY: usize = 4;

/// Result of one non-blocking connect probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Connect still in progress
    Pending,
    /// Descriptor writable, peer reachable
    Connected,
    /// Error or hang-up reported on the descriptor
    Failed,
}

/// Non-blocking stream socket.
///
/// Reads and writes must never block: "no data yet" and "buffer full" are
/// reported as [`io::ErrorKind::WouldBlock`].
pub trait Socket: Read + Write {
    /// Issue a non-blocking connect. In-progress is success; only an
    /// immediate OS rejection is an error.
    fn connect(addr: SocketAddr) -> io::Result<Self>
    where
        Self: Sized;

    /// Probe connect completion without blocking.
    fn poll_connect(&mut self) -> io::Result<Readiness>;

    /// Disable Nagle's algorithm.
    fn set_nodelay(&mut self, nodelay: bool) -> io::Result<()>;
}

/// Writability poll kept only while connecting
struct ConnectProbe {
    poll: Poll,
    events: Events,
}

/// TCP stream socket backed by mio (non-blocking by construction)
pub struct TcpSocket {
    stream: TcpStream,
    probe: Option<ConnectProbe>,
}

impl TcpSocket {
    /// Wrap a stream returned by a listener's `accept`.
    pub fn accepted(stream: TcpStream) -> Self {
        Self {
            stream,
            probe: None,
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    fn release_probe(&mut self) {
        if let Some(probe) = self.probe.take() {
            let _ = probe.poll.registry().deregister(&mut self.stream);
        }
    }
}

impl Socket for TcpSocket {
    fn connect(addr: SocketAddr) -> io::Result<Self> {
        let mut stream = TcpStream::connect(addr)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut stream, CONNECT_TOKEN, Interest::WRITABLE)?;

        Ok(Self {
            stream,
            probe: Some(ConnectProbe {
                poll,
                events: Events::with_capacity(PROBE_EVENTS_CAPACITY),
            }),
        })
    }

    fn poll_connect(&mut self) -> io::Result<Readiness> {
        let Some(probe) = self.probe.as_mut() else {
            return Ok(Readiness::Connected);
        };

        probe
            .poll
            .poll(&mut probe.events, Some(Duration::ZERO))?;

        let mut writable = false;
        let mut failed = false;
        for event in probe.events.iter() {
            if event.is_error() || event.is_write_closed() {
                failed = true;
            }
            if event.is_writable() {
                writable = true;
            }
        }

        let readiness = if failed {
            Readiness::Failed
        } else if !writable {
            Readiness::Pending
        } else if let Some(err) = self.stream.take_error()? {
            log::debug!("connect error reported by socket: {}", err);
            Readiness::Failed
        } else {
            match self.stream.peer_addr() {
                Ok(_) => Readiness::Connected,
                // Spurious wakeup, connect not finished yet
                Err(ref e) if e.kind() == io::ErrorKind::NotConnected => {
                    probe.poll.registry().reregister(
                        &mut self.stream,
                        CONNECT_TOKEN,
                        Interest::WRITABLE,
                    )?;
                    Readiness::Pending
                }
                Err(_) => Readiness::Failed,
            }
        };

        if readiness != Readiness::Pending {
            self.release_probe();
        }
        Ok(readiness)
    }

    fn set_nodelay(&mut self, nodelay: bool) -> io::Result<()> {
        self.stream.set_nodelay(nodelay)
    }
}

impl Read for TcpSocket {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TcpSocket {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Drop for TcpSocket {
    fn drop(&mut self) {
        self.release_probe();
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// True for errors that only mean "try again on the next tick".
#[inline(always)]
pub fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Instant;

    fn poll_until_resolved(socket: &mut TcpSocket) -> Readiness {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            match socket.poll_connect() {
                Ok(Readiness::Pending) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(1));
                }
                Ok(readiness) => return readiness,
                Err(_) => return Readiness::Failed,
            }
        }
    }

    #[test]
    fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut socket = TcpSocket::connect(addr).unwrap();
        assert_eq!(poll_until_resolved(&mut socket), Readiness::Connected);
        assert_eq!(socket.peer_addr().unwrap(), addr);

        // Probe released, later polls report connected without polling
        assert_eq!(socket.poll_connect().unwrap(), Readiness::Connected);
    }

    #[test]
    fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };

        match TcpSocket::connect(addr) {
            Ok(mut socket) => assert_eq!(poll_until_resolved(&mut socket), Readiness::Failed),
            // Some platforms reject loopback connects synchronously
            Err(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionRefused),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(is_transient(&io::Error::from(io::ErrorKind::Interrupted)));
        assert!(!is_transient(&io::Error::from(io::ErrorKind::ConnectionReset)));
    }
}
