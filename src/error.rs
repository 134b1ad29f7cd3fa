use thiserror::Error;

/// Failure taxonomy shared by every component boundary.
///
/// Failures never escape to crash the process: each component converts them
/// into an `Error` notification at its own boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Input rejected before any external call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A job is already running; concurrent starts are refused.
    #[error("a job is already running")]
    AlreadyRunning,

    /// An external call was rejected or the transport dropped.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A stream payload could not be interpreted.
    #[error("malformed payload: {0}")]
    Parse(String),

    /// Reserved for backends that enforce deadlines; the core itself does not.
    #[error("operation timed out")]
    Timeout,
}
