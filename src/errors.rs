use thiserror::Error;

/// Startup failures. Anything raised here ends the process with a non-zero status.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("error initializing Config: {0}")]
    ConfigError(String),

    #[error("error scheduling the task: {0}")]
    ScheduleError(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}
