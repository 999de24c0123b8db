//! Compiled state nodes.
//!
//! Nodes are produced once by the compiler and never change afterwards.
//! They live in a flat arena owned by [`StateTree`](super::StateTree) and
//! refer to each other by index, so the tree has no ownership cycles and
//! snapshot validation is a plain map lookup.

use std::collections::HashMap;

use crate::core::guard::GuardExpr;

/// Index of a node in the [`StateTree`](super::StateTree) arena.
///
/// Indices are assigned in declaration order, so iterating an ordered set
/// of indices visits nodes in document order.
pub type NodeIdx = usize;

/// The closed set of node kinds.
///
/// Kind affects only which structural fields are meaningful; transitions,
/// entry/exit reducers, and activities attach uniformly to every node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A leaf state. `is_final` halts the machine when the node is active.
    Atomic { is_final: bool },
    /// A state with named children, exactly one active at a time.
    Compound { initial: NodeIdx },
    /// A state whose children are regions, all active when it is.
    Parallel,
}

/// A single compiled transition.
///
/// `target` is `None` for internal (reducer-only) transitions. Targets that
/// could not be resolved at compile time are kept as written and surface as
/// errors the first time the transition fires.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionDef {
    pub target: Option<Target>,
    pub guard: Option<GuardExpr>,
    pub assign: Option<String>,
}

/// A resolved or deferred transition target.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Node(NodeIdx),
    Unresolved(String),
}

/// An immutable state node.
///
/// `id` is the absolute dotted path from the synthetic root (for example
/// `submitting.validating`); `key` is the last path segment. The root has
/// an empty id and is never exposed through the public surface.
#[derive(Clone, Debug)]
pub struct StateNode {
    pub id: String,
    pub key: String,
    pub parent: Option<NodeIdx>,
    pub depth: usize,
    pub kind: NodeKind,
    /// Children in declaration order. For parallel nodes these are the
    /// regions.
    pub children: Vec<NodeIdx>,
    /// Event type to candidate transitions, in declaration order.
    pub on: HashMap<String, Vec<TransitionDef>>,
    /// Eventless transitions, evaluated to a fixpoint after every step.
    pub always: Vec<TransitionDef>,
    /// Reducer names folded over the context on entry, in order.
    pub entry: Vec<String>,
    /// Reducer names folded over the context on exit, in order.
    pub exit: Vec<String>,
    /// Activity type names started while the node is active.
    pub activities: Vec<String>,
}

impl StateNode {
    /// Transitions declared for `event_type`, in declaration order.
    pub fn transitions_for(&self, event_type: &str) -> &[TransitionDef] {
        self.on.get(event_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, NodeKind::Atomic { .. })
    }

    pub fn is_final(&self) -> bool {
        matches!(self.kind, NodeKind::Atomic { is_final: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_node(kind: NodeKind) -> StateNode {
        StateNode {
            id: "a".to_string(),
            key: "a".to_string(),
            parent: Some(0),
            depth: 1,
            kind,
            children: Vec::new(),
            on: HashMap::new(),
            always: Vec::new(),
            entry: Vec::new(),
            exit: Vec::new(),
            activities: Vec::new(),
        }
    }

    #[test]
    fn final_is_only_meaningful_on_atomic_nodes() {
        assert!(bare_node(NodeKind::Atomic { is_final: true }).is_final());
        assert!(!bare_node(NodeKind::Atomic { is_final: false }).is_final());
        assert!(!bare_node(NodeKind::Parallel).is_final());
        assert!(!bare_node(NodeKind::Compound { initial: 1 }).is_final());
    }

    #[test]
    fn transitions_for_unknown_event_is_empty() {
        let node = bare_node(NodeKind::Atomic { is_final: false });
        assert!(node.transitions_for("NOPE").is_empty());
    }
}
