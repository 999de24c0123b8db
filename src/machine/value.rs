//! Hierarchical state value projection.
//!
//! A read-only derived view of the active configuration: atomic leaves
//! project to their key, compound nodes to a single-key map, parallel
//! nodes to a map over every region. The synthetic root is invisible.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{NodeIdx, NodeKind, StateTree};

/// The shape of the active state, as seen by a host.
///
/// # Example
///
/// ```rust
/// use stratum::StateValue;
///
/// let value = StateValue::branch([("submitting", StateValue::leaf("failed"))]);
/// assert_eq!(
///     serde_json::to_value(&value).unwrap(),
///     serde_json::json!({ "submitting": "failed" })
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    /// An atomic leaf: the state's key.
    Leaf(String),
    /// A compound or parallel interior: key to child value.
    Branch(BTreeMap<String, StateValue>),
}

impl StateValue {
    pub fn leaf(key: impl Into<String>) -> Self {
        StateValue::Leaf(key.into())
    }

    pub fn branch<K>(entries: impl IntoIterator<Item = (K, StateValue)>) -> Self
    where
        K: Into<String>,
    {
        StateValue::Branch(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

/// Project the active configuration into a [`StateValue`].
///
/// An empty configuration (machine not yet started) projects to an empty
/// branch.
pub(crate) fn project(tree: &StateTree, configuration: &BTreeSet<NodeIdx>) -> StateValue {
    below(tree, configuration, tree.root())
}

/// The value below `idx`, excluding `idx`'s own key.
fn below(tree: &StateTree, configuration: &BTreeSet<NodeIdx>, idx: NodeIdx) -> StateValue {
    let node = tree.node(idx);
    match node.kind {
        NodeKind::Atomic { .. } => StateValue::Branch(BTreeMap::new()),
        NodeKind::Compound { .. } => {
            let active = node
                .children
                .iter()
                .copied()
                .find(|child| configuration.contains(child));
            match active {
                None => StateValue::Branch(BTreeMap::new()),
                Some(child) if tree.node(child).is_atomic() => {
                    StateValue::Leaf(tree.node(child).key.clone())
                }
                Some(child) => StateValue::branch([(
                    tree.node(child).key.clone(),
                    below(tree, configuration, child),
                )]),
            }
        }
        NodeKind::Parallel => StateValue::Branch(
            node.children
                .iter()
                .map(|&region| {
                    (
                        tree.node(region).key.clone(),
                        below(tree, configuration, region),
                    )
                })
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::MachineConfig;
    use serde_json::json;

    fn project_active(config: serde_json::Value, active: &[&str]) -> StateValue {
        let config: MachineConfig = serde_json::from_value(config).unwrap();
        let tree = compile(&config).unwrap();
        let configuration: BTreeSet<NodeIdx> =
            active.iter().map(|id| tree.get(id).unwrap()).collect();
        project(&tree, &configuration)
    }

    #[test]
    fn single_atomic_projects_to_its_key() {
        let value = project_active(
            json!({ "initial": "active", "states": { "active": {} } }),
            &["active"],
        );
        assert_eq!(value, StateValue::leaf("active"));
    }

    #[test]
    fn nested_compounds_project_to_nested_maps() {
        let value = project_active(
            json!({
                "initial": "a",
                "states": {
                    "a": {
                        "initial": "b",
                        "states": { "b": { "initial": "c", "states": { "c": {} } } }
                    }
                }
            }),
            &["a", "a.b", "a.b.c"],
        );
        assert_eq!(
            value,
            StateValue::branch([(
                "a",
                StateValue::branch([("b", StateValue::leaf("c"))])
            )])
        );
    }

    #[test]
    fn parallel_regions_project_to_a_region_map() {
        let value = project_active(
            json!({
                "initial": "player",
                "states": {
                    "player": {
                        "type": "parallel",
                        "states": {
                            "playback": { "initial": "paused", "states": { "paused": {}, "playing": {} } },
                            "volume": { "initial": "normal", "states": { "normal": {}, "muted": {} } }
                        }
                    }
                }
            }),
            &[
                "player",
                "player.playback",
                "player.playback.paused",
                "player.volume",
                "player.volume.normal",
            ],
        );
        assert_eq!(
            value,
            StateValue::branch([(
                "player",
                StateValue::branch([
                    ("playback", StateValue::leaf("paused")),
                    ("volume", StateValue::leaf("normal")),
                ])
            )])
        );
    }

    #[test]
    fn empty_configuration_projects_to_an_empty_branch() {
        let value = project_active(
            json!({ "initial": "a", "states": { "a": {} } }),
            &[],
        );
        assert_eq!(value, StateValue::Branch(BTreeMap::new()));
    }
}
