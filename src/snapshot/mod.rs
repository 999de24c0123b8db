//! Runtime snapshots.
//!
//! A snapshot is the only form the outside world sees the runtime in:
//! the opaque context, the active configuration as a list of state ids,
//! and the per-state entry counters. Snapshots are plain JSON values and
//! carry no behaviour, which keeps them portable across processes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::StateTree;

mod error;

pub use error::SnapshotError;

/// A serialisable capture of machine state.
///
/// The order of `configuration` is not semantically significant; the
/// machine normalises it to document order when dumping. `state_counters`
/// only contains states that have been entered at least once, so every
/// recorded counter is ≥ 1.
///
/// # Example
///
/// ```rust
/// use stratum::Snapshot;
///
/// let snapshot = Snapshot::from_json(
///     r#"{
///         "context": { "count": 3 },
///         "configuration": ["active"],
///         "stateCounters": { "active": 1 }
///     }"#,
/// )
/// .unwrap();
/// assert_eq!(snapshot.configuration, ["active"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub context: Value,
    pub configuration: Vec<String>,
    pub state_counters: BTreeMap<String, u64>,
}

impl Snapshot {
    /// Check this snapshot against a compiled tree.
    ///
    /// Every id in the configuration and the counter map must exist, and
    /// the configuration must be non-empty.
    pub(crate) fn validate(&self, tree: &StateTree) -> Result<(), SnapshotError> {
        if self.configuration.is_empty() {
            return Err(SnapshotError::EmptyConfiguration);
        }
        for id in self.configuration.iter().chain(self.state_counters.keys()) {
            if tree.get(id).is_none() {
                return Err(SnapshotError::UnknownState(id.clone()));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::config::MachineConfig;
    use serde_json::json;

    fn tree() -> StateTree {
        let config: MachineConfig = serde_json::from_value(json!({
            "initial": "a",
            "states": { "a": { "initial": "b", "states": { "b": {} } } }
        }))
        .unwrap();
        compile(&config).unwrap()
    }

    fn snapshot(configuration: &[&str]) -> Snapshot {
        Snapshot {
            context: json!({}),
            configuration: configuration.iter().map(|s| s.to_string()).collect(),
            state_counters: configuration.iter().map(|s| (s.to_string(), 1)).collect(),
        }
    }

    #[test]
    fn known_ids_validate() {
        assert!(snapshot(&["a", "a.b"]).validate(&tree()).is_ok());
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let result = snapshot(&["a", "ghost"]).validate(&tree());
        assert!(matches!(result, Err(SnapshotError::UnknownState(id)) if id == "ghost"));
    }

    #[test]
    fn unknown_counter_ids_are_rejected() {
        let mut snap = snapshot(&["a"]);
        snap.state_counters.insert("ghost".to_string(), 2);
        assert!(matches!(
            snap.validate(&tree()),
            Err(SnapshotError::UnknownState(id)) if id == "ghost"
        ));
    }

    #[test]
    fn empty_configurations_are_rejected() {
        assert!(matches!(
            snapshot(&[]).validate(&tree()),
            Err(SnapshotError::EmptyConfiguration)
        ));
    }

    #[test]
    fn json_round_trip_preserves_the_snapshot() {
        let snap = Snapshot {
            context: json!({ "count": 3, "nested": { "flag": true } }),
            configuration: vec!["a".to_string(), "a.b".to_string()],
            state_counters: [("a".to_string(), 1), ("a.b".to_string(), 2)].into(),
        };
        let back = Snapshot::from_json(&snap.to_json().unwrap()).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn wire_field_names_are_camel_case() {
        let value = serde_json::to_value(snapshot(&["a"])).unwrap();
        assert!(value.get("stateCounters").is_some());
    }
}
