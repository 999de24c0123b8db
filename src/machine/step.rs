//! The step engine.
//!
//! Converts `(event, runtime state)` into a new runtime state: transition
//! selection with shadowing, exit/entry set computation via the least
//! common ancestor, and the bounded eventless fixpoint. The fixpoint is an
//! explicit loop rather than recursion so termination is a counter, not a
//! stack depth.

use tracing::debug;

use crate::core::{Event, GuardExpr, NodeIdx, NodeKind, Target, TransitionDef};
use crate::machine::{Machine, MachineError};
use serde_json::Value;

/// Iteration cap for the eventless fixpoint. Exceeding it means the
/// always-transition graph contains a cycle.
pub(crate) const ALWAYS_LIMIT: usize = 100;

/// One selected transition, paired with the node that declares it.
struct Selected {
    source: NodeIdx,
    transition: TransitionDef,
}

/// Shallow top-level overlay of a reducer result onto the context.
///
/// Object onto object merges key by key; a `null` result is a no-op; any
/// other combination replaces the context wholesale.
fn merge_context(context: &mut Value, patch: Value) {
    match (context, patch) {
        (_, Value::Null) => {}
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                base.insert(key, value);
            }
        }
        (context, patch) => *context = patch,
    }
}

impl Machine {
    /// One full macrostep: apply `event`, then run the fixpoint and
    /// recompute the halted flag. Returns whether anything fired.
    pub(crate) fn macrostep(&mut self, event: &Event) -> Result<bool, MachineError> {
        let selected = self.select_transitions(event, false)?;
        let fired = !selected.is_empty();
        if self.debug {
            debug!(event = %event.kind, selected = selected.len(), "macrostep");
        }
        if fired {
            self.apply_transitions(selected, event)?;
        }
        let always_fired = self.run_always()?;
        self.halted = self.has_active_final();
        Ok(fired || always_fired)
    }

    /// Run eventless transitions to a fixpoint, bounded by [`ALWAYS_LIMIT`].
    ///
    /// Stops when nothing is selected, or when every applied transition in
    /// a round was internal: the configuration cannot change, so another
    /// round would select the same set forever.
    pub(crate) fn run_always(&mut self) -> Result<bool, MachineError> {
        let event = Event::always();
        let mut fired = false;
        for _ in 0..ALWAYS_LIMIT {
            let selected = self.select_transitions(&event, true)?;
            if selected.is_empty() {
                return Ok(fired);
            }
            fired = true;
            let any_external = self.apply_transitions(selected, &event)?;
            if !any_external {
                return Ok(fired);
            }
        }
        Err(MachineError::AlwaysDivergence(ALWAYS_LIMIT))
    }

    /// Select at most one transition per active atomic state.
    ///
    /// Each atomic climbs its ancestor chain; at each node the declared
    /// candidates are tried in order and the first guard-passing one wins,
    /// ending the climb. Identical instances chosen through two atomics are
    /// kept once. A parallel node's own transition is shadowed when any
    /// selected transition originates strictly inside it.
    fn select_transitions(
        &self,
        event: &Event,
        always: bool,
    ) -> Result<Vec<Selected>, MachineError> {
        let mut chosen: Vec<Selected> = Vec::new();
        let mut seen: std::collections::HashSet<(NodeIdx, usize)> = std::collections::HashSet::new();

        for atomic in self.active_atomics() {
            'climb: for ancestor in self.tree.ancestors(atomic) {
                let node = self.tree.node(ancestor);
                let candidates = if always {
                    &node.always[..]
                } else {
                    node.transitions_for(&event.kind)
                };
                for (index, transition) in candidates.iter().enumerate() {
                    let passes = match &transition.guard {
                        None => true,
                        Some(guard) => self.eval_guard(guard, event, ancestor)?,
                    };
                    if passes {
                        if seen.insert((ancestor, index)) {
                            chosen.push(Selected {
                                source: ancestor,
                                transition: transition.clone(),
                            });
                        }
                        break 'climb;
                    }
                }
            }
        }

        // Shadowing is structural: mark every parallel strict ancestor of a
        // selected source, then drop selected transitions sourced at a
        // marked node.
        let mut shadowed: std::collections::HashSet<NodeIdx> = std::collections::HashSet::new();
        for selected in &chosen {
            for ancestor in self.tree.ancestors(selected.source).skip(1) {
                if matches!(self.tree.node(ancestor).kind, NodeKind::Parallel) {
                    shadowed.insert(ancestor);
                }
            }
        }
        chosen.retain(|selected| !shadowed.contains(&selected.source));

        Ok(chosen)
    }

    /// Apply selected transitions in order. Returns whether any of them
    /// was external (had a target).
    fn apply_transitions(
        &mut self,
        selected: Vec<Selected>,
        event: &Event,
    ) -> Result<bool, MachineError> {
        let root = self.tree.root();
        let mut any_external = false;
        for Selected { source, transition } in selected {
            // An earlier transition in this batch may have torn the source
            // down; a dead source has nothing left to do.
            if source != root && !self.configuration.contains(&source) {
                continue;
            }
            match &transition.target {
                None => {
                    if let Some(reducer) = &transition.assign {
                        self.fold_reducer(reducer, event, source)?;
                    }
                }
                Some(Target::Unresolved(raw)) => {
                    return Err(MachineError::UnresolvedTarget {
                        source_state: self.tree.node(source).id.clone(),
                        target: raw.clone(),
                    });
                }
                Some(Target::Node(target)) => {
                    any_external = true;
                    if *target == source {
                        self.deactivate(source, event)?;
                        if let Some(reducer) = &transition.assign {
                            self.fold_reducer(reducer, event, source)?;
                        }
                        self.activate(source, event, true)?;
                    } else {
                        self.run_external(source, *target, transition.assign.as_deref(), event)?;
                    }
                }
            }
        }
        Ok(any_external)
    }

    /// Apply one external transition via the LCA rule.
    ///
    /// When the LCA is an endpoint of the transition (target is an
    /// ancestor of source, or source an ancestor of target) it joins both
    /// the exit and the entry set, so the boundary state is exited and
    /// re-entered. The synthetic root never enters the entry set.
    fn run_external(
        &mut self,
        source: NodeIdx,
        target: NodeIdx,
        assign: Option<&str>,
        event: &Event,
    ) -> Result<(), MachineError> {
        let root = self.tree.root();
        let lca = self.tree.lca(source, target);
        if self.debug {
            debug!(
                source = %self.tree.node(source).id,
                target = %self.tree.node(target).id,
                "external transition"
            );
        }

        let mut exit_chain: Vec<NodeIdx> = self
            .tree
            .ancestors(source)
            .take_while(|&n| n != lca)
            .collect();
        if lca == source || lca == target {
            exit_chain.push(lca);
        }
        for node in exit_chain {
            if node == root || self.configuration.contains(&node) {
                self.deactivate(node, event)?;
            }
        }

        if let Some(reducer) = assign {
            self.fold_reducer(reducer, event, source)?;
        }

        let mut entry_chain: Vec<NodeIdx> = self
            .tree
            .ancestors(target)
            .take_while(|&n| n != lca)
            .collect();
        entry_chain.reverse();
        if (lca == source && lca != root) || lca == target {
            entry_chain.insert(0, lca);
        }
        let last = entry_chain.len().saturating_sub(1);
        for (position, node) in entry_chain.into_iter().enumerate() {
            self.activate(node, event, position == last)?;
        }
        Ok(())
    }

    /// Activate `idx`: bump its entry counter, fold its entry reducers,
    /// optionally follow children, then add it to the configuration.
    ///
    /// Only the explicit target of a transition follows children;
    /// intermediate nodes along an entry path are entered without
    /// descending, since their active child is the next chain node.
    pub(crate) fn activate(
        &mut self,
        idx: NodeIdx,
        event: &Event,
        follow_children: bool,
    ) -> Result<(), MachineError> {
        *self.counters.entry(idx).or_insert(0) += 1;
        let entry_reducers = self.tree.node(idx).entry.clone();
        for reducer in &entry_reducers {
            self.fold_reducer(reducer, event, idx)?;
        }
        if follow_children {
            match self.tree.node(idx).kind {
                NodeKind::Compound { initial } => self.activate(initial, event, true)?,
                NodeKind::Parallel => {
                    let regions = self.tree.node(idx).children.clone();
                    for region in regions {
                        self.activate(region, event, true)?;
                    }
                }
                NodeKind::Atomic { .. } => {}
            }
        }
        self.configuration.insert(idx);
        Ok(())
    }

    /// Deactivate `idx` and every active descendant, leaf-first: fold the
    /// exit reducers in declaration order, then remove from the
    /// configuration.
    fn deactivate(&mut self, idx: NodeIdx, event: &Event) -> Result<(), MachineError> {
        let mut doomed: Vec<NodeIdx> = self
            .configuration
            .iter()
            .copied()
            .filter(|&n| n == idx || self.tree.is_strict_descendant(n, idx))
            .collect();
        doomed.sort_by_key(|&n| std::cmp::Reverse(self.tree.node(n).depth));
        for node in doomed {
            let exit_reducers = self.tree.node(node).exit.clone();
            for reducer in &exit_reducers {
                self.fold_reducer(reducer, event, node)?;
            }
            self.configuration.remove(&node);
        }
        Ok(())
    }

    /// Look up `name` in the registry, apply it, and merge the result into
    /// the context.
    fn fold_reducer(
        &mut self,
        name: &str,
        event: &Event,
        source: NodeIdx,
    ) -> Result<(), MachineError> {
        let patch = {
            let reducer = self
                .registry
                .reducer_fn(name)
                .ok_or_else(|| MachineError::UnknownReducer(name.to_string()))?;
            reducer(&self.context, event, &self.tree.node(source).id)
        };
        merge_context(&mut self.context, patch);
        Ok(())
    }

    /// Evaluate a guard expression against the registry.
    fn eval_guard(
        &self,
        expr: &GuardExpr,
        event: &Event,
        source: NodeIdx,
    ) -> Result<bool, MachineError> {
        match expr {
            GuardExpr::Ref(name) => {
                let guard = self
                    .registry
                    .guard_fn(name)
                    .ok_or_else(|| MachineError::UnknownGuard(name.clone()))?;
                Ok(guard(&self.context, event, &self.tree.node(source).id))
            }
            GuardExpr::And { and } => {
                for sub in and {
                    if !self.eval_guard(sub, event, source)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            GuardExpr::Or { or } => {
                for sub in or {
                    if self.eval_guard(sub, event, source)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            GuardExpr::Not { not } => Ok(!self.eval_guard(not, event, source)?),
        }
    }

    pub(crate) fn active_atomics(&self) -> Vec<NodeIdx> {
        self.configuration
            .iter()
            .copied()
            .filter(|&idx| self.tree.node(idx).is_atomic())
            .collect()
    }

    pub(crate) fn has_active_final(&self) -> bool {
        self.configuration
            .iter()
            .any(|&idx| self.tree.node(idx).is_final())
    }
}
