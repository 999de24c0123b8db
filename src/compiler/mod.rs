//! One-shot configuration compilation.
//!
//! Turns a declarative [`MachineConfig`] into an immutable [`StateTree`]:
//! nodes get absolute dotted ids in declaration order, transition shapes
//! are normalised, and targets are resolved in a second pass once every id
//! is known.

use std::collections::HashMap;

use crate::config::{MachineConfig, StateConfig, StateKind, TransitionCase, TransitionDecl};
use crate::core::{NodeIdx, NodeKind, StateNode, StateTree, Target, TransitionDef};

mod error;

pub use error::CompileError;

/// Compile a configuration value into a state tree.
///
/// Builds a synthetic compound root whose children are the top-level
/// states and whose initial child is named by the machine-level `initial`.
pub fn compile(config: &MachineConfig) -> Result<StateTree, CompileError> {
    let mut nodes: Vec<StateNode> = Vec::new();
    let mut index: HashMap<String, NodeIdx> = HashMap::new();

    nodes.push(StateNode {
        id: String::new(),
        key: String::new(),
        parent: None,
        depth: 0,
        // Initial child is patched in once the top-level states exist.
        kind: NodeKind::Compound { initial: 0 },
        children: Vec::new(),
        on: compile_event_map(&config.on),
        always: Vec::new(),
        entry: Vec::new(),
        exit: Vec::new(),
        activities: Vec::new(),
    });

    for (key, declaration) in &config.states {
        build_node(&mut nodes, &mut index, 0, key, declaration)?;
    }

    let initial = child_by_key(&nodes, 0, &config.initial).ok_or_else(|| {
        CompileError::UnknownMachineInitial {
            initial: config.initial.clone(),
        }
    })?;
    nodes[0].kind = NodeKind::Compound { initial };

    resolve_targets(&mut nodes, &index);

    Ok(StateTree::from_parts(nodes, index))
}

/// Recursively build `declaration` under `parent`, returning its index.
fn build_node(
    nodes: &mut Vec<StateNode>,
    index: &mut HashMap<String, NodeIdx>,
    parent: NodeIdx,
    key: &str,
    declaration: &StateConfig,
) -> Result<NodeIdx, CompileError> {
    let id = if nodes[parent].id.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", nodes[parent].id, key)
    };
    let depth = nodes[parent].depth + 1;

    let idx = nodes.len();
    nodes.push(StateNode {
        id: id.clone(),
        key: key.to_string(),
        parent: Some(parent),
        depth,
        kind: NodeKind::Atomic { is_final: false },
        children: Vec::new(),
        on: compile_event_map(&declaration.on),
        always: declaration
            .always
            .as_ref()
            .map(compile_transitions)
            .unwrap_or_default(),
        entry: declaration.on_entry.names().to_vec(),
        exit: declaration.on_exit.names().to_vec(),
        activities: declaration.activities.names().to_vec(),
    });
    index.insert(id.clone(), idx);
    nodes[parent].children.push(idx);

    for (child_key, child) in &declaration.states {
        build_node(nodes, index, idx, child_key, child)?;
    }

    let kind = infer_kind(nodes, idx, &id, declaration)?;
    nodes[idx].kind = kind;
    Ok(idx)
}

/// Kind inference: an explicit `type` wins; otherwise children plus
/// `initial` make a compound, children without `initial` fall back to
/// parallel, and no children at all means atomic.
fn infer_kind(
    nodes: &[StateNode],
    idx: NodeIdx,
    id: &str,
    declaration: &StateConfig,
) -> Result<NodeKind, CompileError> {
    let has_children = !nodes[idx].children.is_empty();
    match declaration.kind {
        Some(StateKind::Final) => {
            if has_children {
                return Err(CompileError::FinalWithChildren(id.to_string()));
            }
            Ok(NodeKind::Atomic { is_final: true })
        }
        Some(StateKind::Parallel) => Ok(NodeKind::Parallel),
        None if !has_children => Ok(NodeKind::Atomic { is_final: false }),
        None => match &declaration.initial {
            Some(initial) => {
                let child = child_by_key(nodes, idx, initial).ok_or_else(|| {
                    CompileError::UnknownInitial {
                        state: id.to_string(),
                        initial: initial.clone(),
                    }
                })?;
                Ok(NodeKind::Compound { initial: child })
            }
            None => Ok(NodeKind::Parallel),
        },
    }
}

fn child_by_key(nodes: &[StateNode], parent: NodeIdx, key: &str) -> Option<NodeIdx> {
    nodes[parent]
        .children
        .iter()
        .copied()
        .find(|&c| nodes[c].key == key)
}

fn compile_event_map(
    on: &indexmap::IndexMap<String, TransitionDecl>,
) -> HashMap<String, Vec<TransitionDef>> {
    on.iter()
        .map(|(event, decl)| (event.clone(), compile_transitions(decl)))
        .collect()
}

fn compile_transitions(decl: &TransitionDecl) -> Vec<TransitionDef> {
    decl.cases()
        .iter()
        .map(|case| match case {
            TransitionCase::Target(target) => TransitionDef {
                target: Some(Target::Unresolved(target.clone())),
                guard: None,
                assign: None,
            },
            TransitionCase::Config(spec) => TransitionDef {
                target: spec.target.clone().map(Target::Unresolved),
                guard: spec.guard.clone(),
                assign: spec.assign.clone(),
            },
        })
        .collect()
}

/// Second pass: resolve every transition target now that all ids exist.
///
/// Precedence is load-bearing: an exact absolute id wins, then a sibling of
/// the source (so a bare key names a sibling, not an unrelated top-level
/// state of the same name), then a top-level state key. Anything else stays
/// unresolved and errors on use.
fn resolve_targets(nodes: &mut [StateNode], index: &HashMap<String, NodeIdx>) {
    for idx in 0..nodes.len() {
        let mut on = std::mem::take(&mut nodes[idx].on);
        let mut always = std::mem::take(&mut nodes[idx].always);
        for transition in on.values_mut().flatten().chain(always.iter_mut()) {
            if let Some(Target::Unresolved(raw)) = &transition.target {
                if let Some(found) = resolve_one(nodes, index, idx, raw) {
                    transition.target = Some(Target::Node(found));
                }
            }
        }
        nodes[idx].on = on;
        nodes[idx].always = always;
    }
}

fn resolve_one(
    nodes: &[StateNode],
    index: &HashMap<String, NodeIdx>,
    source: NodeIdx,
    raw: &str,
) -> Option<NodeIdx> {
    if let Some(&exact) = index.get(raw) {
        return Some(exact);
    }
    if let Some(parent) = nodes[source].parent {
        if let Some(sibling) = child_by_key(nodes, parent, raw) {
            return Some(sibling);
        }
    }
    child_by_key(nodes, 0, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compiled(value: serde_json::Value) -> StateTree {
        let config: MachineConfig = serde_json::from_value(value).unwrap();
        compile(&config).unwrap()
    }

    #[test]
    fn ids_dot_keys_from_the_root() {
        let tree = compiled(json!({
            "initial": "submitting",
            "states": {
                "submitting": {
                    "initial": "validating",
                    "states": { "validating": {}, "sending": {} }
                }
            }
        }));
        assert!(tree.get("submitting").is_some());
        assert!(tree.get("submitting.validating").is_some());
        assert!(tree.get("submitting.sending").is_some());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn kind_inference_follows_the_declaration_shape() {
        let tree = compiled(json!({
            "initial": "a",
            "states": {
                "a": { "initial": "b", "states": { "b": {} } },
                "p": { "type": "parallel", "states": { "x": {}, "y": {} } },
                "implied": { "states": { "x": {}, "y": {} } },
                "done": { "type": "final" },
                "leaf": {}
            }
        }));
        let node = |id: &str| tree.node(tree.get(id).unwrap());
        assert!(matches!(node("a").kind, NodeKind::Compound { .. }));
        assert!(matches!(node("p").kind, NodeKind::Parallel));
        assert!(matches!(node("implied").kind, NodeKind::Parallel));
        assert!(node("done").is_final());
        assert!(matches!(
            node("leaf").kind,
            NodeKind::Atomic { is_final: false }
        ));
    }

    #[test]
    fn sibling_targets_win_over_top_level_states() {
        // Both a top-level state and a sibling are called "retry"; the bare
        // key must resolve to the sibling.
        let tree = compiled(json!({
            "initial": "outer",
            "states": {
                "outer": {
                    "initial": "working",
                    "states": {
                        "working": { "on": { "FAIL": "retry" } },
                        "retry": {}
                    }
                },
                "retry": {}
            }
        }));
        let working = tree.node(tree.get("outer.working").unwrap());
        let target = match &working.transitions_for("FAIL")[0].target {
            Some(Target::Node(idx)) => *idx,
            other => panic!("expected a resolved target, got {other:?}"),
        };
        assert_eq!(tree.node(target).id, "outer.retry");
    }

    #[test]
    fn absolute_ids_win_over_siblings() {
        let tree = compiled(json!({
            "initial": "outer",
            "states": {
                "outer": {
                    "initial": "working",
                    "states": {
                        "working": { "on": { "ESCAPE": "other.deep" } },
                        "other": {}
                    }
                },
                "other": { "initial": "deep", "states": { "deep": {} } }
            }
        }));
        let working = tree.node(tree.get("outer.working").unwrap());
        let target = match &working.transitions_for("ESCAPE")[0].target {
            Some(Target::Node(idx)) => *idx,
            other => panic!("expected a resolved target, got {other:?}"),
        };
        assert_eq!(tree.node(target).id, "other.deep");
    }

    #[test]
    fn unresolvable_targets_are_kept_as_written() {
        let tree = compiled(json!({
            "initial": "a",
            "states": { "a": { "on": { "GO": "nowhere" } } }
        }));
        let a = tree.node(tree.get("a").unwrap());
        assert_eq!(
            a.transitions_for("GO")[0].target,
            Some(Target::Unresolved("nowhere".to_string()))
        );
    }

    #[test]
    fn machine_level_transitions_attach_to_the_root() {
        let tree = compiled(json!({
            "initial": "a",
            "on": { "RESET": "a" },
            "states": { "a": {}, "b": {} }
        }));
        let root = tree.node(tree.root());
        assert_eq!(root.transitions_for("RESET").len(), 1);
        assert!(matches!(
            root.transitions_for("RESET")[0].target,
            Some(Target::Node(_))
        ));
    }

    #[test]
    fn unknown_machine_initial_is_a_compile_error() {
        let config: MachineConfig = serde_json::from_value(json!({
            "initial": "missing",
            "states": { "a": {} }
        }))
        .unwrap();
        assert!(matches!(
            compile(&config),
            Err(CompileError::UnknownMachineInitial { .. })
        ));
    }

    #[test]
    fn unknown_compound_initial_is_a_compile_error() {
        let config: MachineConfig = serde_json::from_value(json!({
            "initial": "a",
            "states": {
                "a": { "initial": "missing", "states": { "b": {} } }
            }
        }))
        .unwrap();
        assert!(matches!(
            compile(&config),
            Err(CompileError::UnknownInitial { .. })
        ));
    }

    #[test]
    fn final_states_cannot_declare_children() {
        let config: MachineConfig = serde_json::from_value(json!({
            "initial": "a",
            "states": {
                "a": { "type": "final", "states": { "b": {} } }
            }
        }))
        .unwrap();
        assert!(matches!(
            compile(&config),
            Err(CompileError::FinalWithChildren(id)) if id == "a"
        ));
    }

    #[test]
    fn transition_declaration_order_is_preserved() {
        let tree = compiled(json!({
            "initial": "v",
            "states": {
                "v": {
                    "always": [
                        { "target": "ok", "guard": "isValid" },
                        "bad"
                    ]
                },
                "ok": {},
                "bad": {}
            }
        }));
        let v = tree.node(tree.get("v").unwrap());
        assert_eq!(v.always.len(), 2);
        assert!(v.always[0].guard.is_some());
        assert!(v.always[1].guard.is_none());
    }
}
