//! Guard expressions.
//!
//! A guard expression names atomic guards by string and combines them with
//! AND, OR, and NOT. Keeping guards nominal keeps configuration values
//! serialisable; the predicates themselves live in the
//! [`Registry`](super::Registry) and are resolved at evaluation time.

use serde::{Deserialize, Serialize};

/// A guard expression over named predicates.
///
/// In configuration values this is either a bare guard name or a
/// `{"and": […]}`, `{"or": […]}`, or `{"not": …}` object, nested to any
/// depth.
///
/// # Example
///
/// ```rust
/// use stratum::GuardExpr;
///
/// let expr: GuardExpr = serde_json::from_value(serde_json::json!({
///     "and": ["isValid", { "not": "isLocked" }]
/// }))
/// .unwrap();
///
/// match expr {
///     GuardExpr::And { ref and } => assert_eq!(and.len(), 2),
///     _ => panic!("expected a conjunction"),
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GuardExpr {
    /// Reference to a registered guard by name.
    Ref(String),
    And { and: Vec<GuardExpr> },
    Or { or: Vec<GuardExpr> },
    Not { not: Box<GuardExpr> },
}

impl GuardExpr {
    /// Reference a named guard.
    pub fn guard(name: impl Into<String>) -> Self {
        GuardExpr::Ref(name.into())
    }
}
