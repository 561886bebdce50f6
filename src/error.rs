use thiserror::Error;

/// Errors surfaced synchronously by scheduler operations.
///
/// Stage failures are not part of this enum: they are recorded on the
/// failing task and reported through a `batch.error` notification.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Scheduler is not initialized")]
    NotInitialized,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Batch not found: {0}")]
    NotFound(String),

    #[error("Async runtime unavailable: {0}")]
    Runtime(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event emission failed: {0}")]
    Event(String),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for SchedulerError {
    fn from(err: anyhow::Error) -> Self {
        SchedulerError::Other(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
