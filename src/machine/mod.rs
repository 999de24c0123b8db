//! The mutable interpreter runtime.
//!
//! [`Machine`] owns the compiled tree, the registry of named behaviours,
//! and the runtime state: the opaque context, the active configuration,
//! per-state entry counters, and the optional snapshot timeline. Execution
//! is strictly single-threaded and synchronous; a [`send`](Machine::send)
//! returns only once the configuration has been stabilised by the
//! eventless fixpoint and any snapshot has been recorded.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;
use tracing::debug;

use crate::compiler::{compile, CompileError};
use crate::config::MachineConfig;
use crate::core::{Event, NodeIdx, NodeKind, Registry, StateTree};
use crate::history::Timeline;
use crate::snapshot::Snapshot;

mod activity;
mod error;
mod step;
mod value;

pub use activity::ActivityInstance;
pub use error::MachineError;
pub use value::StateValue;

/// A running statechart interpreter.
///
/// # Lifecycle
///
/// A machine is *constructed* by [`Machine::new`], optionally *loaded*
/// from a snapshot, *started* exactly once, and *halted* when a final
/// atomic state becomes active. Events sent after the halt are silently
/// ignored; every other lifecycle misuse is a [`MachineError`].
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use stratum::{Event, Machine, MachineConfig, Registry};
///
/// let config: MachineConfig = serde_json::from_value(json!({
///     "initialContext": { "count": 0 },
///     "initial": "active",
///     "states": {
///         "active": { "on": { "INCREMENT": { "assign": "increment" } } }
///     }
/// }))
/// .unwrap();
///
/// let registry = Registry::new().reducer("increment", |ctx, _event, _state| {
///     json!({ "count": ctx["count"].as_i64().unwrap_or(0) + 1 })
/// });
///
/// let mut machine = Machine::new(config, registry).unwrap();
/// machine.start().unwrap();
/// machine.send(Event::new("INCREMENT")).unwrap();
/// assert_eq!(machine.context()["count"], 1);
/// ```
pub struct Machine {
    pub(crate) tree: StateTree,
    pub(crate) registry: Registry,
    pub(crate) context: Value,
    pub(crate) configuration: BTreeSet<NodeIdx>,
    pub(crate) counters: HashMap<NodeIdx, u64>,
    pub(crate) started: bool,
    pub(crate) loaded: bool,
    pub(crate) halted: bool,
    pub(crate) debug: bool,
    pub(crate) timeline: Option<Timeline>,
}

impl Machine {
    /// Compile `config` and seed the runtime. The machine is constructed
    /// but not yet started.
    pub fn new(config: MachineConfig, registry: Registry) -> Result<Self, CompileError> {
        let tree = compile(&config)?;
        Ok(Self {
            tree,
            registry,
            context: config.initial_context,
            configuration: BTreeSet::new(),
            counters: HashMap::new(),
            started: false,
            loaded: false,
            halted: false,
            debug: config.debug,
            timeline: config.time_travel.then(Timeline::new),
        })
    }

    /// Start the machine. Required exactly once.
    ///
    /// From *constructed* this activates the root's initial chain; from
    /// *loaded* it runs the eventless fixpoint on the restored
    /// configuration. Either way the first snapshot (index 0) is recorded
    /// when time travel is enabled.
    pub fn start(&mut self) -> Result<(), MachineError> {
        if self.started {
            return Err(MachineError::AlreadyStarted);
        }
        let event = Event::init();
        if !self.loaded {
            if let NodeKind::Compound { initial } = self.tree.node(self.tree.root()).kind {
                self.activate(initial, &event, true)?;
            }
        }
        self.run_always()?;
        self.halted = self.has_active_final();
        self.started = true;
        self.record_snapshot();
        Ok(())
    }

    /// Process one external event into a stable configuration.
    ///
    /// Sends before `start` error; sends on a halted machine are silently
    /// ignored. When the timeline cursor is not at the end, history after
    /// the cursor is discarded first (branching).
    pub fn send(&mut self, event: Event) -> Result<(), MachineError> {
        if !self.started {
            return Err(MachineError::NotStarted);
        }
        if Event::is_reserved(&event.kind) {
            return Err(MachineError::ReservedEventType(event.kind));
        }
        if self.halted {
            return Ok(());
        }
        if let Some(timeline) = &mut self.timeline {
            timeline.branch();
        }

        let configuration_before = self.configuration.clone();
        let context_before = self.context.clone();

        self.macrostep(&event)?;

        if self.configuration != configuration_before || self.context != context_before {
            self.record_snapshot();
        }
        Ok(())
    }

    /// Install a snapshot. Only legal before `start`.
    ///
    /// Validates that every referenced id exists and that the
    /// configuration is non-empty. The eventless fixpoint is *not* run
    /// here; that is `start`'s job, which keeps rehydration idempotent
    /// across engine updates that changed always-transition graphs.
    pub fn load(&mut self, snapshot: Snapshot) -> Result<(), MachineError> {
        if self.started {
            return Err(MachineError::LoadAfterStart);
        }
        snapshot.validate(&self.tree)?;
        self.restore(&snapshot);
        self.loaded = true;
        Ok(())
    }

    /// Serialise the current runtime state.
    pub fn dump(&self) -> Result<Snapshot, MachineError> {
        if self.configuration.is_empty() {
            return Err(MachineError::EmptyConfiguration);
        }
        Ok(self.snapshot())
    }

    /// Move the timeline cursor back `n` steps (clamped) and restore.
    pub fn rewind(&mut self, n: usize) -> Result<(), MachineError> {
        if !self.started {
            return Err(MachineError::NotStarted);
        }
        let snapshot = {
            let timeline = self
                .timeline
                .as_mut()
                .ok_or(MachineError::TimeTravelDisabled)?;
            timeline.rewind(n).cloned()
        };
        if let Some(snapshot) = snapshot {
            self.restore(&snapshot);
        }
        Ok(())
    }

    /// Move the timeline cursor forward `n` steps (clamped) and restore.
    pub fn forward(&mut self, n: usize) -> Result<(), MachineError> {
        if !self.started {
            return Err(MachineError::NotStarted);
        }
        let snapshot = {
            let timeline = self
                .timeline
                .as_mut()
                .ok_or(MachineError::TimeTravelDisabled)?;
            timeline.forward(n).cloned()
        };
        if let Some(snapshot) = snapshot {
            self.restore(&snapshot);
        }
        Ok(())
    }

    /// The opaque context value.
    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Active state ids in document order. Empty before `start`/`load`.
    pub fn configuration(&self) -> Vec<&str> {
        self.configuration
            .iter()
            .map(|&idx| self.tree.node(idx).id.as_str())
            .collect()
    }

    /// The hierarchical state value derived from the configuration.
    pub fn state_value(&self) -> StateValue {
        value::project(&self.tree, &self.configuration)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True iff some active atomic state is final.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The snapshot timeline, when time travel is enabled.
    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    /// Activity instances declared by the active states.
    pub fn active_activities(&self) -> Result<Vec<ActivityInstance>, MachineError> {
        if !self.started {
            return Err(MachineError::NotStarted);
        }
        let mut instances = Vec::new();
        for &idx in &self.configuration {
            let node = self.tree.node(idx);
            let counter = self.counters.get(&idx).copied().unwrap_or(0);
            for activity in &node.activities {
                instances.push(ActivityInstance {
                    activity: activity.clone(),
                    state_id: node.id.clone(),
                    instance_id: counter,
                });
            }
        }
        Ok(instances)
    }

    /// True while `instance`'s state is active and has not been re-entered
    /// since the instance was stamped.
    pub fn is_activity_relevant(&self, instance: &ActivityInstance) -> bool {
        match self.tree.get(&instance.state_id) {
            Some(idx) => {
                self.configuration.contains(&idx)
                    && self.counters.get(&idx).copied() == Some(instance.instance_id)
            }
            None => false,
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            context: self.context.clone(),
            configuration: self
                .configuration
                .iter()
                .map(|&idx| self.tree.node(idx).id.clone())
                .collect(),
            state_counters: self
                .counters
                .iter()
                .map(|(&idx, &count)| (self.tree.node(idx).id.clone(), count))
                .collect(),
        }
    }

    fn record_snapshot(&mut self) {
        if self.timeline.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(timeline) = &mut self.timeline {
            timeline.record(snapshot);
        }
    }

    /// Install `snapshot` into the runtime. `halted` is recomputed from
    /// the restored configuration.
    fn restore(&mut self, snapshot: &Snapshot) {
        self.context = snapshot.context.clone();
        self.configuration = snapshot
            .configuration
            .iter()
            .filter_map(|id| self.tree.get(id))
            .collect();
        self.counters = snapshot
            .state_counters
            .iter()
            .filter_map(|(id, &count)| self.tree.get(id).map(|idx| (idx, count)))
            .collect();
        self.halted = self.has_active_final();
        if self.debug {
            debug!(states = ?snapshot.configuration, "restored snapshot");
        }
    }
}
