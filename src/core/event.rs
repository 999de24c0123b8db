//! Events sent to a machine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event type used for the initial activation step.
pub const INIT_EVENT: &str = "stratum.init";

/// Event type used when evaluating eventless transitions.
pub const ALWAYS_EVENT: &str = "stratum.always";

/// An event routed through the machine.
///
/// Routing uses only the `type` field; the whole value is passed to guards
/// and reducers, so any extra payload fields travel with it.
///
/// # Example
///
/// ```rust
/// use stratum::Event;
///
/// let event = Event::new("SUBMIT").with("retries", 2);
/// assert_eq!(event.kind, "SUBMIT");
/// assert_eq!(event.payload["retries"], 2);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Map::new(),
        }
    }

    /// Attach a payload field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    /// The synthetic event seen by entry reducers during `start`.
    pub fn init() -> Self {
        Self::new(INIT_EVENT)
    }

    /// The synthetic event seen by guards during always-step evaluation.
    pub fn always() -> Self {
        Self::new(ALWAYS_EVENT)
    }

    /// True for the two event types reserved for internal use.
    pub fn is_reserved(kind: &str) -> bool {
        kind == INIT_EVENT || kind == ALWAYS_EVENT
    }
}
