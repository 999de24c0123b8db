//! Named guard and reducer tables.
//!
//! Configuration values reference behaviours by string identifiers; the
//! registry is the side table those names resolve against. This keeps the
//! structural tree free of closures and snapshot-portable across processes.

use std::collections::HashMap;

use serde_json::Value;

use crate::core::event::Event;

/// A pure predicate over `(context, event, source state id)`.
pub type GuardFn = Box<dyn Fn(&Value, &Event, &str) -> bool + Send + Sync>;

/// A pure function over `(context, event, state id)` returning a partial
/// context to shallow-merge over the current one.
pub type ReducerFn = Box<dyn Fn(&Value, &Event, &str) -> Value + Send + Sync>;

/// Guard and reducer functions, registered by name.
///
/// Unknown names do not fail at registration or compile time: a name may
/// be referenced only by branches that never become active. They fail the
/// first time a step tries to evaluate them.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use stratum::Registry;
///
/// let registry = Registry::new()
///     .guard("isValid", |ctx, _event, _state| ctx["valid"] == true)
///     .reducer("reset", |_ctx, _event, _state| json!({ "count": 0 }));
///
/// assert!(registry.contains_guard("isValid"));
/// assert!(registry.contains_reducer("reset"));
/// ```
#[derive(Default)]
pub struct Registry {
    guards: HashMap<String, GuardFn>,
    reducers: HashMap<String, ReducerFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guard predicate under `name`.
    pub fn guard<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value, &Event, &str) -> bool + Send + Sync + 'static,
    {
        self.guards.insert(name.into(), Box::new(predicate));
        self
    }

    /// Register a reducer under `name`.
    pub fn reducer<F>(mut self, name: impl Into<String>, reducer: F) -> Self
    where
        F: Fn(&Value, &Event, &str) -> Value + Send + Sync + 'static,
    {
        self.reducers.insert(name.into(), Box::new(reducer));
        self
    }

    pub fn guard_fn(&self, name: &str) -> Option<&GuardFn> {
        self.guards.get(name)
    }

    pub fn reducer_fn(&self, name: &str) -> Option<&ReducerFn> {
        self.reducers.get(name)
    }

    pub fn contains_guard(&self, name: &str) -> bool {
        self.guards.contains_key(name)
    }

    pub fn contains_reducer(&self, name: &str) -> bool {
        self.reducers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registered_functions_are_retrievable_by_name() {
        let registry = Registry::new()
            .guard("positive", |ctx, _event, _state| {
                ctx["n"].as_i64().unwrap_or(0) > 0
            })
            .reducer("bump", |ctx, _event, _state| {
                json!({ "n": ctx["n"].as_i64().unwrap_or(0) + 1 })
            });

        let ctx = json!({ "n": 2 });
        let event = Event::new("TICK");

        let guard = registry.guard_fn("positive").unwrap();
        assert!(guard(&ctx, &event, "a"));

        let reducer = registry.reducer_fn("bump").unwrap();
        assert_eq!(reducer(&ctx, &event, "a"), json!({ "n": 3 }));
    }

    #[test]
    fn unknown_names_resolve_to_none() {
        let registry = Registry::new();
        assert!(registry.guard_fn("missing").is_none());
        assert!(registry.reducer_fn("missing").is_none());
    }

    #[test]
    fn guards_receive_the_whole_event_value() {
        let registry = Registry::new().guard("matches", |_ctx, event, _state| {
            event.payload.get("flag") == Some(&json!(true))
        });

        let guard = registry.guard_fn("matches").unwrap();
        let ctx = json!({});
        assert!(guard(&ctx, &Event::new("X").with("flag", true), "a"));
        assert!(!guard(&ctx, &Event::new("X"), "a"));
    }
}
