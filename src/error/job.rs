use thiserror::Error;

/// Structural fault of a job handed to an execution strategy.
///
/// These never describe a probe result; a job that returns normally always
/// carries its own outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("job panicked: {message}")]
    Panicked { message: String },
    #[error("job was never started: {reason}")]
    NotStarted { reason: String },
    #[error("job was cancelled")]
    Cancelled,
}
