//! Runtime error types.

use thiserror::Error;

use crate::snapshot::SnapshotError;

/// Errors raised by machine lifecycle operations and steps.
///
/// Guard and reducer panics are not represented here: user code failures
/// propagate unchanged, and the machine state is undefined for the
/// interrupted step. Nothing is retried.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("machine is already started")]
    AlreadyStarted,

    #[error("machine is not started; call start() first")]
    NotStarted,

    #[error("snapshots can only be loaded before start()")]
    LoadAfterStart,

    #[error("time travel is not enabled for this machine")]
    TimeTravelDisabled,

    #[error("configuration is empty; start or load the machine before dumping")]
    EmptyConfiguration,

    #[error("event type '{0}' is reserved for internal use")]
    ReservedEventType(String),

    /// A transition whose target never resolved was selected.
    #[error("transition target '{target}' on state '{source_state}' does not resolve to any state")]
    UnresolvedTarget { source_state: String, target: String },

    #[error("unknown guard '{0}'")]
    UnknownGuard(String),

    #[error("unknown reducer '{0}'")]
    UnknownReducer(String),

    /// The eventless fixpoint did not settle; the configuration contains a
    /// cycle of always-transitions. Treat the machine state as corrupted.
    #[error("always-transitions did not settle after {0} iterations")]
    AlwaysDivergence(usize),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
