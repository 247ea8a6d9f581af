//! Error types for sigtally.

use thiserror::Error;

/// Main error type for sigtally.
///
/// Primitive-level failures (fork, handler registration, send, wait) are
/// fatal to a run; configuration problems are caught before anything is
/// spawned.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Payload channel error: {0}")]
    Channel(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sigtally operations.
pub type Result<T> = std::result::Result<T, TallyError>;
