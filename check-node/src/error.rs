//! Error types for the node daemon.

use crate::config::ConfigError;
use crate::coordinator::CoordinatorError;
use crate::runner::RunnerError;
use crate::transport::TransportError;

/// Main error type for node operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Peer transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Local runner error.
    #[error("runner error: {0}")]
    Runner(#[from] RunnerError),

    /// Cluster coordination error.
    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;
