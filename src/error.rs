//! Error types for the neck tracker library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Landmark array does not cover the fixed correspondence indices.
    ///
    /// This means the landmark source and the index mapping disagree, so the
    /// frame is aborted and the error surfaces to the caller.
    #[error("Degenerate landmark input: {0}")]
    DegenerateInput(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Landmark or face detector adapter failed
    #[error("Landmark source error: {0}")]
    LandmarkSource(String),

    /// Recorded landmark stream could not be decoded
    #[error("Replay error: {0}")]
    Replay(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
