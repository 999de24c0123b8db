//! Core structural types.
//!
//! This module holds the immutable parts of a machine: the compiled state
//! tree, events, guard expressions, and the registry of named behaviours.
//! Everything here is pure; the mutable runtime lives in
//! [`machine`](crate::machine).

mod event;
mod guard;
mod node;
mod registry;
mod tree;

pub use event::{Event, ALWAYS_EVENT, INIT_EVENT};
pub use guard::GuardExpr;
pub use node::{NodeIdx, NodeKind, StateNode, Target, TransitionDef};
pub use registry::{GuardFn, ReducerFn, Registry};
pub use tree::{Ancestors, StateTree};
