//! Error types for the nodecheck wire contract.

use thiserror::Error;

/// Errors that can occur while encoding or decoding nodecheck messages.
#[derive(Debug, Error)]
pub enum WireError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),

    /// A report carried both an error and a warning
    #[error("report may carry an error or a warning, not both")]
    ConflictingOutcome,
}
