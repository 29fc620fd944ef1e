use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("notification rejected: {0}")]
    Rejected(String),

    #[error("notification timed out")]
    TimedOut,

    #[error("{0}")]
    Other(String),
}
