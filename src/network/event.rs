//! Events produced by `process`
//!
//! A closed set: every processing call yields at most one of these, and the
//! caller consumes it exactly once.

use std::fmt;

/// Result of an outbound connect (or of accepting an inbound one)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    Succeeded,
    Failed,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Orderly shutdown by the peer (read returned zero)
    PeerClosed,
    /// Any other socket error
    Lost,
}

/// Transport event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<U = u8> {
    Connection(ConnectionOutcome),
    Disconnection(DisconnectReason),
    /// One complete frame body
    Payload(Vec<U>),
}

impl<U> Event<U> {
    #[inline]
    pub fn is_connection(&self) -> bool {
        matches!(self, Event::Connection(_))
    }

    #[inline]
    pub fn is_disconnection(&self) -> bool {
        matches!(self, Event::Disconnection(_))
    }

    #[inline]
    pub fn is_payload(&self) -> bool {
        matches!(self, Event::Payload(_))
    }

    /// Payload units, if this is a payload event
    pub fn into_payload(self) -> Option<Vec<U>> {
        match self {
            Event::Payload(units) => Some(units),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionOutcome::Succeeded => f.write_str("succeeded"),
            ConnectionOutcome::Failed => f.write_str("failed"),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectReason::PeerClosed => f.write_str("peer closed"),
            DisconnectReason::Lost => f.write_str("lost"),
        }
    }
}

impl<U> fmt::Display for Event<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Connection(outcome) => write!(f, "connection {}", outcome),
            Event::Disconnection(reason) => write!(f, "disconnection ({})", reason),
            Event::Payload(units) => write!(f, "payload of {} units", units.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kinds() {
        let connected: Event = Event::Connection(ConnectionOutcome::Succeeded);
        assert!(connected.is_connection());
        assert!(!connected.is_payload());

        let lost: Event = Event::Disconnection(DisconnectReason::Lost);
        assert!(lost.is_disconnection());
        assert_eq!(lost.to_string(), "disconnection (lost)");

        let payload: Event<u16> = Event::Payload(vec![1, 2]);
        assert_eq!(payload.to_string(), "payload of 2 units");
        assert_eq!(payload.into_payload(), Some(vec![1, 2]));
        assert_eq!(connected.into_payload(), None);
    }
}
