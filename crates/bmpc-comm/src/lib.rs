//! Transport used by boolean circuit schedulers to exchange secret-share bytes between parties.
//!
//! Backends are written against [`PartyCommunicationAgent`], a fixed-size-exact byte channel to
//! one other party. Swapping the in-process transport for a network transport must be invisible
//! to anything coded against this trait.
//!
//! The [`in_memory`] module provides the reference implementation: a
//! [`InMemoryPartyCommunicationAgentHost`] pairs two logical parties running in the same
//! process, usually on two threads.

#![deny(missing_docs, unreachable_pub, unused_must_use)]

mod error;
pub mod in_memory;

pub use error::{CommError, ErrorKind};
pub use in_memory::{InMemoryPartyCommunicationAgent, InMemoryPartyCommunicationAgentHost};

use itybity::{FromBitIterator, ToBits};

/// Identifies a party taking part in a computation.
pub type PartyId = usize;

/// Cumulative traffic observed by an agent or a scheduler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrafficStatistics {
    /// Bytes sent.
    pub sent: u64,
    /// Bytes received.
    pub received: u64,
}

impl std::ops::Add for TrafficStatistics {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            sent: self.sent + rhs.sent,
            received: self.received + rhs.received,
        }
    }
}

impl std::iter::Sum for TrafficStatistics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, stats| acc + stats)
    }
}

/// An endpoint that exchanges bytes with exactly one other party.
///
/// Both directions are exact: whatever is passed to [`send`](Self::send) arrives in order and
/// [`receive`](Self::receive) returns precisely the requested number of bytes, regardless of how
/// the peer fragmented its sends.
pub trait PartyCommunicationAgent: Send {
    /// Sends `data` to the peer.
    fn send(&mut self, data: &[u8]) -> Result<(), CommError>;

    /// Receives exactly `size` bytes from the peer, blocking until they are available.
    fn receive(&mut self, size: usize) -> Result<Vec<u8>, CommError>;

    /// Returns the bytes sent and received through this agent so far.
    fn traffic_statistics(&self) -> TrafficStatistics;

    /// Sends a sequence of booleans, packed LSB-first into `ceil(len / 8)` bytes.
    fn send_bool(&mut self, data: &[bool]) -> Result<(), CommError> {
        // Pad to a whole number of bytes.
        let mut bits = data.to_vec();
        bits.resize(data.len().div_ceil(8) * 8, false);
        self.send(&Vec::<u8>::from_lsb0_iter(bits))
    }

    /// Receives `len` booleans sent with [`send_bool`](Self::send_bool).
    fn receive_bool(&mut self, len: usize) -> Result<Vec<bool>, CommError> {
        let bytes = self.receive(len.div_ceil(8))?;
        let mut bits = bytes.as_slice().to_lsb0_vec();
        bits.truncate(len);
        Ok(bits)
    }

    /// Sends a `u64` in little-endian byte order.
    fn send_u64(&mut self, value: u64) -> Result<(), CommError> {
        self.send(&value.to_le_bytes())
    }

    /// Receives a `u64` sent with [`send_u64`](Self::send_u64).
    fn receive_u64(&mut self) -> Result<u64, CommError> {
        let bytes = self.receive(8)?;
        let bytes: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| CommError::UnexpectedMessageSize {
                expected: 8,
                actual: bytes.len(),
            })?;
        Ok(u64::from_le_bytes(bytes))
    }
}

impl<A: PartyCommunicationAgent + ?Sized> PartyCommunicationAgent for Box<A> {
    fn send(&mut self, data: &[u8]) -> Result<(), CommError> {
        (**self).send(data)
    }

    fn receive(&mut self, size: usize) -> Result<Vec<u8>, CommError> {
        (**self).receive(size)
    }

    fn traffic_statistics(&self) -> TrafficStatistics {
        (**self).traffic_statistics()
    }
}
