use bmpc_scheduler::{ErrorKind, SchedulerError};

/// Errors that can occur when working with typed values.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum FrontendError {
    #[error("value {value} does not fit in a {width}-bit signed integer")]
    ValueOutOfRange { value: i64, width: usize },
    #[error("input value is too large: maximum string width is {max_width}, was given {given}")]
    StringTooLong { max_width: usize, given: usize },
    #[error("string contains non-ASCII characters")]
    NotAscii,
    #[error("expected {expected} bit shares, got {actual}")]
    InvalidShare { expected: usize, actual: usize },
    #[error("`{0}` is not implemented")]
    Unimplemented(&'static str),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

impl FrontendError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrontendError::ValueOutOfRange { .. }
            | FrontendError::StringTooLong { .. }
            | FrontendError::NotAscii
            | FrontendError::InvalidShare { .. } => ErrorKind::InvalidInput,
            FrontendError::Unimplemented(_) => ErrorKind::Unimplemented,
            FrontendError::Scheduler(err) => err.kind(),
        }
    }
}
