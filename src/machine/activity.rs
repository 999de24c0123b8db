//! Activity instances.
//!
//! The interpreter owns no side-effect machinery; activities are tracked
//! as data so an external manager can start and stop the real work. The
//! entry counter stamped into each instance lets that manager tell a fresh
//! instance from a stale one after re-entry.

use serde::{Deserialize, Serialize};

/// A running activity, identified by `(type, state, entry counter)`.
///
/// An instance is *relevant* while its state is active and the state's
/// entry counter still equals `instance_id`. Once the state is left and
/// re-entered, old instances go stale even though the state id matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityInstance {
    /// The declared activity type.
    #[serde(rename = "type")]
    pub activity: String,
    /// Absolute id of the state that declares the activity.
    pub state_id: String,
    /// The state's entry counter at the time it was entered.
    pub instance_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wire_shape_uses_type_and_camel_case() {
        let instance = ActivityInstance {
            activity: "pollServer".to_string(),
            state_id: "on.connected".to_string(),
            instance_id: 2,
        };
        assert_eq!(
            serde_json::to_value(&instance).unwrap(),
            json!({
                "type": "pollServer",
                "stateId": "on.connected",
                "instanceId": 2
            })
        );
    }
}
