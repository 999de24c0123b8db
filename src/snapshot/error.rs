//! Snapshot error types.

use thiserror::Error;

/// Errors raised while validating or (de)serialising snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot references a state id the compiled tree does not have.
    #[error("snapshot references unknown state '{0}'")]
    UnknownState(String),

    /// A snapshot must describe at least one active state.
    #[error("snapshot configuration is empty")]
    EmptyConfiguration,

    #[error("snapshot serialization failed: {0}")]
    SerializationFailed(String),

    #[error("snapshot deserialization failed: {0}")]
    DeserializationFailed(String),
}
