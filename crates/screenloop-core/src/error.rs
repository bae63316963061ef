//! Error types for screenloop

use thiserror::Error;

/// Main error type for screenloop operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("X11 connection error: {0}")]
    X11Connection(String),

    #[error("X11 extension not available: {0}")]
    X11ExtensionMissing(String),

    #[error("Screen capture failed: {0}")]
    CaptureError(String),

    #[error("Invalid capture region: {0}")]
    InvalidRegion(String),

    #[error("Unsupported display session: {0}")]
    Unsupported(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation unavailable while a recording session is active")]
    SessionActive,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using screenloop's Error
pub type Result<T> = std::result::Result<T, Error>;
