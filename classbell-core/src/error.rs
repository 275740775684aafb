//! Error types for classbell.

use thiserror::Error;

/// Errors that can occur in classbell operations.
#[derive(Error, Debug)]
pub enum BellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}'. Expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid course: {0}")]
    InvalidCourse(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Period table error: {0}")]
    PeriodTable(String),

    #[error("Timer refused trigger {key}: {reason}")]
    TimerDenied { key: String, reason: String },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for classbell operations.
pub type BellResult<T> = Result<T, BellError>;
