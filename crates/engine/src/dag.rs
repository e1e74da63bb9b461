//! Task dependency graph.
//!
//! An edge `from -> to` means "`from` depends on `to`" (`to` has to be
//! completed first). Edges that would close a cycle are refused at insertion
//! time, so the graph stays acyclic.
//!
//! Adjacency is kept in insertion order, which makes serialization and
//! topological order reproducible for the same sequence of calls.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use taskrank_core::TaskId;

/// A node in the serialized graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode<Id> {
    /// Node identifier
    pub id: Id,
}

/// An edge in the serialized graph: `from` depends on `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge<Id> {
    /// Dependent node
    pub from: Id,
    /// Dependency node
    pub to: Id,
}

/// Flat node/edge lists for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedGraph<Id> {
    /// All nodes
    pub nodes: Vec<GraphNode<Id>>,
    /// All edges
    pub edges: Vec<GraphEdge<Id>>,
}

/// Directed acyclic graph over task identifiers.
///
/// The graph only stores identifiers and edges, never task attributes.
#[derive(Debug, Clone)]
pub struct DependencyGraph<Id = TaskId> {
    /// node -> nodes it depends on
    depends_on: IndexMap<Id, IndexSet<Id>>,
    /// node -> nodes that depend on it
    depended_on_by: IndexMap<Id, IndexSet<Id>>,
}

impl<Id> Default for DependencyGraph<Id> {
    fn default() -> Self {
        Self {
            depends_on: IndexMap::new(),
            depended_on_by: IndexMap::new(),
        }
    }
}

impl<Id: Clone + Eq + Hash> DependencyGraph<Id> {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Does nothing if it already exists.
    pub fn add_node(&mut self, id: Id) {
        self.depends_on.entry(id.clone()).or_default();
        self.depended_on_by.entry(id).or_default();
    }

    /// Record that `from` depends on `to`.
    ///
    /// Returns `false` and leaves the graph untouched when `to` can already
    /// reach `from` (including `from == to`), since the edge would close a
    /// cycle. Missing endpoints are added as nodes when the edge is accepted.
    pub fn add_edge(&mut self, from: Id, to: Id) -> bool {
        if self.would_create_cycle(&from, &to) {
            return false;
        }

        self.add_node(from.clone());
        self.add_node(to.clone());
        if let Some(deps) = self.depends_on.get_mut(&from) {
            deps.insert(to.clone());
        }
        if let Some(dependents) = self.depended_on_by.get_mut(&to) {
            dependents.insert(from);
        }
        true
    }

    /// Remove a node and every edge touching it. Does nothing if absent.
    pub fn remove_node(&mut self, id: &Id) {
        let Some(deps) = self.depends_on.shift_remove(id) else {
            return;
        };
        let dependents = self.depended_on_by.shift_remove(id).unwrap_or_default();

        for dep in &deps {
            if let Some(set) = self.depended_on_by.get_mut(dep) {
                set.shift_remove(id);
            }
        }
        for dependent in &dependents {
            if let Some(set) = self.depends_on.get_mut(dependent) {
                set.shift_remove(id);
            }
        }
    }

    /// Nodes that `id` depends on. Empty if the node is absent.
    pub fn dependencies(&self, id: &Id) -> Vec<Id> {
        self.depends_on
            .get(id)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Nodes that depend on `id`. Empty if the node is absent.
    pub fn dependents(&self, id: &Id) -> Vec<Id> {
        self.depended_on_by
            .get(id)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Check if the graph contains a node.
    pub fn contains(&self, id: &Id) -> bool {
        self.depends_on.contains_key(id)
    }

    /// Check if `from` directly depends on `to`.
    pub fn has_edge(&self, from: &Id, to: &Id) -> bool {
        self.depends_on
            .get(from)
            .is_some_and(|deps| deps.contains(to))
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.depends_on.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.depends_on.values().map(IndexSet::len).sum()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.depends_on.is_empty()
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Id> {
        self.depends_on.keys()
    }

    /// Whether `from` reaches `to` by following depends-on edges.
    ///
    /// A node always reaches itself.
    pub fn can_reach(&self, from: &Id, to: &Id) -> bool {
        if from == to {
            return true;
        }

        let mut visited: HashSet<&Id> = HashSet::new();
        let mut stack = vec![from];
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            if let Some(deps) = self.depends_on.get(node) {
                stack.extend(deps.iter());
            }
        }
        false
    }

    /// Whether adding `from -> to` would close a cycle.
    pub fn would_create_cycle(&self, from: &Id, to: &Id) -> bool {
        self.can_reach(to, from)
    }

    /// Nodes ordered so that every node comes after the nodes it depends on.
    ///
    /// Kahn's algorithm seeded with the nodes that have no dependencies.
    /// Nodes left on a cycle are omitted rather than reported.
    pub fn topological_sort(&self) -> Vec<Id> {
        let mut remaining: IndexMap<&Id, usize> = self
            .depends_on
            .iter()
            .map(|(node, deps)| (node, deps.len()))
            .collect();

        let mut queue: VecDeque<&Id> = remaining
            .iter()
            .filter(|&(_, &count)| count == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut sorted = Vec::with_capacity(self.depends_on.len());
        while let Some(node) = queue.pop_front() {
            sorted.push(node.clone());
            let Some(dependents) = self.depended_on_by.get(node) else {
                continue;
            };
            for dependent in dependents {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        sorted
    }

    /// Flatten into node and edge lists.
    pub fn serialize(&self) -> SerializedGraph<Id> {
        let nodes = self
            .depends_on
            .keys()
            .map(|id| GraphNode { id: id.clone() })
            .collect();

        let edges = self
            .depends_on
            .iter()
            .flat_map(|(from, deps)| {
                deps.iter().map(move |to| GraphEdge {
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect();

        SerializedGraph { nodes, edges }
    }
}
