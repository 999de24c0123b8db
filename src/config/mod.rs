//! Declarative configuration values.
//!
//! The interpreter consumes already-parsed configuration values; how a host
//! obtains them (file load, network, trusted evaluation) is out of scope.
//! Every type here derives serde both ways with `camelCase` field names, so
//! JSON configurations deserialize directly. Declaration order is
//! semantically load-bearing: transition priority, region order, and entry
//! ordering all follow it, which is why the `states` and `on` maps are
//! [`IndexMap`]s rather than hash maps.
//!
//! Guards and reducers are referenced by name only; the functions
//! themselves are registered in a [`Registry`](crate::Registry) passed to
//! [`Machine::new`](crate::Machine::new).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::GuardExpr;

/// A whole machine declaration.
///
/// # Example
///
/// ```rust
/// use stratum::MachineConfig;
///
/// let config: MachineConfig = serde_json::from_value(serde_json::json!({
///     "initialContext": { "count": 0 },
///     "initial": "idle",
///     "timeTravel": true,
///     "states": {
///         "idle": { "on": { "START": "running" } },
///         "running": { "on": { "STOP": "idle" } }
///     }
/// }))
/// .unwrap();
///
/// assert_eq!(config.initial, "idle");
/// assert!(config.time_travel);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineConfig {
    /// Seed for the opaque context value. Defaults to JSON `null`.
    #[serde(default)]
    pub initial_context: Value,
    /// Key of the initially active top-level state.
    pub initial: String,
    /// Top-level states in declaration order.
    pub states: IndexMap<String, StateConfig>,
    /// Machine-level transitions, attached to the synthetic root.
    #[serde(default)]
    pub on: IndexMap<String, TransitionDecl>,
    /// Emit `tracing` events describing each step.
    #[serde(default)]
    pub debug: bool,
    /// Record a snapshot timeline and enable rewind/forward.
    #[serde(default)]
    pub time_travel: bool,
}

/// One state declaration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateConfig {
    /// `"final"` or `"parallel"`. Omitted for plain atomic and compound
    /// states, whose kind is inferred from the other fields.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StateKind>,
    /// Initial child key. Required for compound states; a state with
    /// children but no `initial` is treated as parallel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial: Option<String>,
    /// Child states in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub states: IndexMap<String, StateConfig>,
    /// Event-driven transitions.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub on: IndexMap<String, TransitionDecl>,
    /// Eventless transitions, evaluated to a fixpoint after every step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always: Option<TransitionDecl>,
    /// Reducer names folded over the context on entry.
    #[serde(default, skip_serializing_if = "NameList::is_empty")]
    pub on_entry: NameList,
    /// Reducer names folded over the context on exit.
    #[serde(default, skip_serializing_if = "NameList::is_empty")]
    pub on_exit: NameList,
    /// Activity types running while the state is active.
    #[serde(default, skip_serializing_if = "NameList::is_empty")]
    pub activities: NameList,
}

/// Explicit state kind markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Final,
    Parallel,
}

/// A transition declaration: one candidate or an ordered candidate list.
///
/// Accepts the three shapes of the configuration language: a bare target
/// string, a single `{ target?, guard?, assign? }` object, or a list
/// mixing both.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransitionDecl {
    One(TransitionCase),
    Many(Vec<TransitionCase>),
}

impl TransitionDecl {
    /// The candidates in declaration order.
    pub fn cases(&self) -> &[TransitionCase] {
        match self {
            TransitionDecl::One(case) => std::slice::from_ref(case),
            TransitionDecl::Many(cases) => cases,
        }
    }
}

/// A single transition candidate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransitionCase {
    /// Bare target key or id.
    Target(String),
    Config(TransitionConfig),
}

/// The object form of a transition candidate.
///
/// `target` omitted makes the transition internal (reducer-only).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<GuardExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign: Option<String>,
}

/// A bare name or a list of names.
///
/// `onEntry: "reset"` and `onEntry: ["reset", "log"]` both deserialize.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameList {
    One(String),
    Many(Vec<String>),
}

impl NameList {
    pub fn names(&self) -> &[String] {
        match self {
            NameList::One(name) => std::slice::from_ref(name),
            NameList::Many(names) => names,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

impl Default for NameList {
    fn default() -> Self {
        NameList::Many(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn transition_accepts_bare_target_strings() {
        let decl: TransitionDecl = serde_json::from_value(json!("yellow")).unwrap();
        let [TransitionCase::Target(target)] = decl.cases() else {
            panic!("expected a single bare target");
        };
        assert_eq!(target, "yellow");
    }

    #[test]
    fn transition_accepts_single_objects() {
        let decl: TransitionDecl = serde_json::from_value(json!({
            "target": "sending",
            "guard": "isValid",
            "assign": "markAttempt"
        }))
        .unwrap();
        let [TransitionCase::Config(spec)] = decl.cases() else {
            panic!("expected a single object candidate");
        };
        assert_eq!(spec.target.as_deref(), Some("sending"));
        assert_eq!(spec.guard, Some(GuardExpr::guard("isValid")));
        assert_eq!(spec.assign.as_deref(), Some("markAttempt"));
    }

    #[test]
    fn transition_accepts_ordered_candidate_lists() {
        let decl: TransitionDecl = serde_json::from_value(json!([
            { "target": "sending", "guard": "isValid" },
            "failed"
        ]))
        .unwrap();
        let cases = decl.cases();
        assert_eq!(cases.len(), 2);
        assert!(matches!(&cases[0], TransitionCase::Config(_)));
        assert!(matches!(&cases[1], TransitionCase::Target(t) if t == "failed"));
    }

    #[test]
    fn internal_transitions_omit_the_target() {
        let decl: TransitionDecl =
            serde_json::from_value(json!({ "assign": "increment" })).unwrap();
        let [TransitionCase::Config(spec)] = decl.cases() else {
            panic!("expected a single object candidate");
        };
        assert!(spec.target.is_none());
        assert_eq!(spec.assign.as_deref(), Some("increment"));
    }

    #[test]
    fn entry_lists_accept_one_name_or_many() {
        let one: StateConfig =
            serde_json::from_value(json!({ "onEntry": "reset" })).unwrap();
        assert_eq!(one.on_entry.names(), ["reset".to_string()]);

        let many: StateConfig =
            serde_json::from_value(json!({ "onEntry": ["reset", "log"] })).unwrap();
        assert_eq!(many.on_entry.names().len(), 2);
    }

    #[test]
    fn machine_defaults_are_inert() {
        let config: MachineConfig = serde_json::from_value(json!({
            "initial": "a",
            "states": { "a": {} }
        }))
        .unwrap();
        assert_eq!(config.initial_context, Value::Null);
        assert!(config.on.is_empty());
        assert!(!config.debug);
        assert!(!config.time_travel);
    }
}
