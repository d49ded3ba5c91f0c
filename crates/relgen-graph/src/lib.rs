//! Dependency ordering for relgen tables.
//!
//! [`DependencyGraph`] is a small directed graph with a deterministic,
//! stack-based depth-first topological sort that reports the edge closing a
//! cycle. [`Topology`] applies it to a [`relgen_core::Schema`]: tables are
//! nodes, `ref` columns are edges, and the result is the order in which table
//! producers are started plus the wiring of every cross-table stream.
//!
//! # Example
//!
//! ```rust
//! use relgen_graph::DependencyGraph;
//!
//! let mut graph: DependencyGraph<&str> = DependencyGraph::new();
//! graph.add_edge("orders", "customer", None).unwrap();
//!
//! assert_eq!(graph.topological_sort(true).unwrap(), vec!["customer", "orders"]);
//! ```

pub mod graph;
pub mod topology;

pub use graph::{DependencyGraph, GraphError};
pub use topology::{Subscription, Topology, TopologyError};
