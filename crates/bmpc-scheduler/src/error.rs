use bmpc_comm::{CommError, ErrorKind};

/// Errors that can occur when driving a [`Scheduler`](crate::Scheduler).
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum SchedulerError {
    #[error("batch sizes do not match: {left} and {right}")]
    BatchSizeMismatch { left: usize, right: usize },
    #[error("cannot batch up an empty list of wires")]
    EmptyBatching,
    #[error("unbatching strategy covers {expected} values but the batch holds {actual}")]
    InvalidUnbatching { expected: usize, actual: usize },
    #[error("party {party} is not part of this computation ({parties} parties)")]
    InvalidParty { party: usize, parties: usize },
    #[error(transparent)]
    Comm(#[from] CommError),
}

impl SchedulerError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchedulerError::BatchSizeMismatch { .. }
            | SchedulerError::EmptyBatching
            | SchedulerError::InvalidUnbatching { .. }
            | SchedulerError::InvalidParty { .. } => ErrorKind::InvalidInput,
            SchedulerError::Comm(err) => err.kind(),
        }
    }
}
