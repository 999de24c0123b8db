//! Compile errors.

use thiserror::Error;

/// Errors raised while compiling a configuration value.
///
/// All of these are fatal: no machine is produced. Unresolvable transition
/// targets are deliberately not compile errors; they are kept as written
/// and surface the first time the transition fires.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("initial state '{initial}' does not name a top-level state")]
    UnknownMachineInitial { initial: String },

    #[error("initial state '{initial}' does not name a child of '{state}'")]
    UnknownInitial { state: String, initial: String },

    #[error("state '{0}' is marked final but declares children")]
    FinalWithChildren(String),
}
