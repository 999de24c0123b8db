//! The immutable state tree.
//!
//! A flat arena of [`StateNode`]s indexed by [`NodeIdx`], plus an id map.
//! All queries are pure; the tree holds no runtime state.

use std::collections::HashMap;

use crate::core::node::{NodeIdx, StateNode};

/// The compiled structural model of a machine.
///
/// Index 0 is always the synthetic root: a compound node over the top-level
/// states, with an empty id. The root is implicitly active but never stored
/// in a configuration and never exposed to callers.
#[derive(Clone, Debug)]
pub struct StateTree {
    nodes: Vec<StateNode>,
    index: HashMap<String, NodeIdx>,
}

impl StateTree {
    pub(crate) fn from_parts(nodes: Vec<StateNode>, index: HashMap<String, NodeIdx>) -> Self {
        Self { nodes, index }
    }

    /// The synthetic root node.
    pub fn root(&self) -> NodeIdx {
        0
    }

    pub fn node(&self, idx: NodeIdx) -> &StateNode {
        &self.nodes[idx]
    }

    /// Look up a node by absolute dotted id.
    pub fn get(&self, id: &str) -> Option<NodeIdx> {
        self.index.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in document order, root included.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIdx, &StateNode)> {
        self.nodes.iter().enumerate()
    }

    /// The ancestor chain `idx, parent(idx), …, root`, self inclusive.
    pub fn ancestors(&self, idx: NodeIdx) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(idx),
        }
    }

    /// True iff `node` is a strict descendant of `of`.
    pub fn is_strict_descendant(&self, node: NodeIdx, of: NodeIdx) -> bool {
        self.ancestors(node).skip(1).any(|a| a == of)
    }

    /// Least common ancestor of `a` and `b`.
    ///
    /// When one node is an ancestor of the other, the LCA is that node
    /// itself; `lca(n, n)` is `n`.
    pub fn lca(&self, a: NodeIdx, b: NodeIdx) -> NodeIdx {
        let mut a = a;
        let mut b = b;
        while self.nodes[a].depth > self.nodes[b].depth {
            a = self.nodes[a].parent.unwrap_or(0);
        }
        while self.nodes[b].depth > self.nodes[a].depth {
            b = self.nodes[b].parent.unwrap_or(0);
        }
        while a != b {
            a = self.nodes[a].parent.unwrap_or(0);
            b = self.nodes[b].parent.unwrap_or(0);
        }
        a
    }
}

/// Iterator over a node's ancestor chain, self first, root last.
pub struct Ancestors<'a> {
    tree: &'a StateTree,
    next: Option<NodeIdx>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIdx;

    fn next(&mut self) -> Option<NodeIdx> {
        let current = self.next?;
        self.next = self.tree.nodes[current].parent;
        Some(current)
    }
}
