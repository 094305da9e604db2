//! Error types for the rigging library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Joint catalog violates its structural invariants
    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    /// Joint id not present in the active catalog
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    /// A second analysis was started while one is still running
    #[error("An analysis is already in progress")]
    AnalysisInFlight,

    /// Operation needs a loaded model
    #[error("No model loaded")]
    NoModel,

    /// Persisted session is older than its time-to-live
    #[error("Saved session expired")]
    SessionExpired,
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
