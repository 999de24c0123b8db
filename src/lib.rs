//! Stratum: a pure hierarchical statechart interpreter
//!
//! Stratum interprets Harel-style statecharts (compound and parallel
//! regions, guarded transitions, eventless microsteps) with one deliberate
//! restriction: all state-affecting logic is expressed as *pure reducers*
//! over an opaque context value. The interpreter is synchronous and
//! deterministic and owns no side-effect machinery; timers, I/O, and
//! spawned work are the concern of its host, which observes entry counters
//! and activity instances instead.
//!
//! # Core Concepts
//!
//! - **Configuration value**: a declarative, serialisable machine
//!   description consumed by the compiler
//! - **State tree**: the immutable compiled model of atomic, compound, and
//!   parallel nodes
//! - **Registry**: guard and reducer functions resolved by name, so the
//!   tree itself stays free of closures
//! - **Machine**: the mutable runtime: active configuration, context,
//!   entry counters, and the optional time-travel timeline
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use stratum::{Event, Machine, MachineConfig, Registry, StateValue};
//!
//! let config: MachineConfig = serde_json::from_value(json!({
//!     "initialContext": { "cycleCount": 0 },
//!     "initial": "green",
//!     "states": {
//!         "green": { "on": { "TIMER": { "target": "yellow", "assign": "countCycle" } } },
//!         "yellow": { "on": { "TIMER": "red" } },
//!         "red": { "on": { "TIMER": "green" } }
//!     }
//! }))
//! .unwrap();
//!
//! let registry = Registry::new().reducer("countCycle", |ctx, _event, _state| {
//!     json!({ "cycleCount": ctx["cycleCount"].as_i64().unwrap_or(0) + 1 })
//! });
//!
//! let mut machine = Machine::new(config, registry).unwrap();
//! machine.start().unwrap();
//! for _ in 0..3 {
//!     machine.send(Event::new("TIMER")).unwrap();
//! }
//! assert_eq!(machine.state_value(), StateValue::leaf("green"));
//! assert_eq!(machine.context()["cycleCount"], 1);
//! ```

pub mod compiler;
pub mod config;
pub mod core;
pub mod history;
pub mod machine;
pub mod snapshot;

pub use compiler::{compile, CompileError};
pub use config::{
    MachineConfig, NameList, StateConfig, StateKind, TransitionCase, TransitionDecl,
    TransitionConfig,
};
pub use crate::core::{
    Event, GuardExpr, NodeIdx, NodeKind, Registry, StateNode, StateTree, Target, TransitionDef,
    ALWAYS_EVENT, INIT_EVENT,
};
pub use history::Timeline;
pub use machine::{ActivityInstance, Machine, MachineError, StateValue};
pub use snapshot::{Snapshot, SnapshotError};
