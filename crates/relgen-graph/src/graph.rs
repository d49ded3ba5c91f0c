//! Directed graph with a depth-first topological sort.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Error type for graph operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// An edge from a node to itself
    #[error("Self-referencing edge on '{node}'")]
    SelfEdge { node: String },

    /// An edge closed a cycle during the sort
    #[error("Cycle detected at edge '{from}' -> '{to}' (visited: {visited:?})")]
    Cycle {
        from: String,
        to: String,
        visited: Vec<String>,
    },
}

#[derive(Debug, Clone)]
struct Edge<V> {
    target: usize,
    value: Option<V>,
}

/// Directed graph whose adjacency keeps edge-insertion order.
///
/// Nodes are identified by value; `V` is an optional payload carried by each
/// edge.
#[derive(Debug, Clone)]
pub struct DependencyGraph<N, V = ()> {
    nodes: Vec<N>,
    index: HashMap<N, usize>,
    adjacency: Vec<Vec<Edge<V>>>,
}

impl<N, V> Default for DependencyGraph<N, V> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
        }
    }
}

impl<N, V> DependencyGraph<N, V>
where
    N: Clone + Eq + Hash + Display,
{
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning `false` if it already existed.
    pub fn add_node(&mut self, node: N) -> bool {
        if self.index.contains_key(&node) {
            return false;
        }
        self.insert(node);
        true
    }

    fn insert(&mut self, node: N) -> usize {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(node.clone(), idx);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        idx
    }

    /// Add a directed edge, creating missing nodes.
    pub fn add_edge(&mut self, start: N, end: N, value: Option<V>) -> Result<(), GraphError> {
        if start == end {
            return Err(GraphError::SelfEdge {
                node: start.to_string(),
            });
        }
        let from = self.insert(start);
        let target = self.insert(end);
        self.adjacency[from].push(Edge { target, value });
        Ok(())
    }

    /// Whether the graph contains `node`.
    pub fn contains(&self, node: &N) -> bool {
        self.index.contains_key(node)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Outgoing edges of `node` in insertion order. Empty for unknown nodes.
    pub fn adjacent(&self, node: &N) -> Vec<(&N, Option<&V>)> {
        self.index
            .get(node)
            .map(|&idx| {
                self.adjacency[idx]
                    .iter()
                    .map(|edge| (&self.nodes[edge.target], edge.value.as_ref()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Topologically sort the graph.
    ///
    /// In the forward order every edge's start precedes its end; `reverse`
    /// returns the exact reverse. Among siblings, earlier-inserted edges come
    /// first in the forward order.
    pub fn topological_sort(&self, reverse: bool) -> Result<Vec<N>, GraphError> {
        let count = self.nodes.len();
        let mut visited = vec![false; count];
        let mut on_trail = vec![false; count];
        let mut visit_order: Vec<usize> = Vec::with_capacity(count);
        let mut finished: Vec<usize> = Vec::with_capacity(count);

        for root in 0..count {
            if visited[root] {
                continue;
            }

            visited[root] = true;
            on_trail[root] = true;
            visit_order.push(root);

            // (node, children left to explore); children are taken from the
            // back so the first-inserted edge finishes last.
            let mut work = vec![(root, self.adjacency[root].len())];

            while let Some(&(node, remaining)) = work.last() {
                if remaining == 0 {
                    work.pop();
                    on_trail[node] = false;
                    finished.push(node);
                    continue;
                }

                if let Some(top) = work.last_mut() {
                    top.1 -= 1;
                }

                let child = self.adjacency[node][remaining - 1].target;
                if on_trail[child] {
                    return Err(GraphError::Cycle {
                        from: self.nodes[node].to_string(),
                        to: self.nodes[child].to_string(),
                        visited: visit_order
                            .iter()
                            .map(|&idx| self.nodes[idx].to_string())
                            .collect(),
                    });
                }
                if !visited[child] {
                    visited[child] = true;
                    on_trail[child] = true;
                    visit_order.push(child);
                    work.push((child, self.adjacency[child].len()));
                }
            }
        }

        if !reverse {
            finished.reverse();
        }
        Ok(finished
            .into_iter()
            .map(|idx| self.nodes[idx].clone())
            .collect())
    }
}
