use std::fmt::Display;

use crate::PartyId;

/// Coarse classification shared by every error in the framework.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A caller-supplied value violates a capacity or shape constraint. The caller may fix the
    /// input and retry.
    InvalidInput,
    /// An object was used outside of its ownership contract.
    InvalidState,
    /// The transport returned a byte count different from the one requested.
    TransportInvariantViolation,
    /// The operation is declared but not provided.
    Unimplemented,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidInput => write!(f, "invalid input"),
            ErrorKind::InvalidState => write!(f, "invalid state"),
            ErrorKind::TransportInvariantViolation => write!(f, "transport invariant violation"),
            ErrorKind::Unimplemented => write!(f, "unimplemented"),
        }
    }
}

/// Errors that can occur when exchanging bytes between parties.
#[derive(Debug, thiserror::Error)]
pub enum CommError {
    /// The agent for this party has already been handed out.
    #[error("agent for party {0} has already been extracted")]
    AgentAlreadyExtracted(PartyId),
    /// The party id does not belong to this pairing.
    #[error("invalid party id {0}, expected 0 or 1")]
    InvalidParty(PartyId),
    /// A receive returned a different number of bytes than requested.
    #[error("unexpected message size: expected {expected} bytes, got {actual}")]
    UnexpectedMessageSize {
        /// Requested number of bytes.
        expected: usize,
        /// Number of bytes returned.
        actual: usize,
    },
    /// A queue lock was poisoned by a panicking peer thread.
    #[error("queue lock was poisoned")]
    Poisoned,
}

impl CommError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CommError::InvalidParty(_) => ErrorKind::InvalidInput,
            CommError::AgentAlreadyExtracted(_) | CommError::Poisoned => ErrorKind::InvalidState,
            CommError::UnexpectedMessageSize { .. } => ErrorKind::TransportInvariantViolation,
        }
    }
}
