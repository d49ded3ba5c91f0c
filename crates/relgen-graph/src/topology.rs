//! Table topology derived from column references.
//!
//! Every `ref` column adds an edge from the referencing table to the
//! referenced table. Generation runs in the reverse topological order so
//! upstream tables start before the tables that consume their values.

use crate::graph::{DependencyGraph, GraphError};
use relgen_core::{BufferPolicy, ConfigError, Schema, StreamKey};
use std::collections::BTreeMap;
use tracing::debug;

/// Error type for topology construction.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// Structural schema error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Self-reference or reference cycle
    #[error("Invalid table references: {0}")]
    Graph(#[from] GraphError),
}

/// A column consuming another table's stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// Upstream stream
    pub key: StreamKey,
    /// Consuming table
    pub table: String,
    /// Consuming column
    pub column: String,
    /// How the consumer buffers the stream
    pub policy: BufferPolicy,
}

/// Generation order and stream wiring for a schema.
#[derive(Debug, Clone)]
pub struct Topology {
    graph: DependencyGraph<String, String>,
    order: Vec<String>,
    published: BTreeMap<String, Vec<String>>,
    subscriptions: Vec<Subscription>,
}

impl Topology {
    /// Validate the schema and compute its generation order.
    pub fn build(schema: &Schema) -> Result<Self, TopologyError> {
        schema.validate()?;

        let mut graph: DependencyGraph<String, String> = DependencyGraph::new();
        for table in &schema.tables {
            graph.add_node(table.name.clone());
        }

        let mut subscriptions = Vec::new();
        for table in &schema.tables {
            for column in &table.columns {
                let (Some(reference), Some(policy)) = (&column.reference, column.buffer_policy())
                else {
                    continue;
                };
                graph.add_edge(
                    table.name.clone(),
                    reference.table.clone(),
                    Some(column.name.clone()),
                )?;
                subscriptions.push(Subscription {
                    key: reference.stream_key(),
                    table: table.name.clone(),
                    column: column.name.clone(),
                    policy,
                });
            }
        }

        let order = graph.topological_sort(true)?;
        debug!("Generation order: {:?}", order);

        // Published columns keep the upstream table's column order.
        let mut published: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for table in &schema.tables {
            let columns: Vec<String> = table
                .columns
                .iter()
                .filter(|c| {
                    subscriptions
                        .iter()
                        .any(|s| s.key.table == table.name && s.key.column == c.name)
                })
                .map(|c| c.name.clone())
                .collect();
            if !columns.is_empty() {
                published.insert(table.name.clone(), columns);
            }
        }

        Ok(Self {
            graph,
            order,
            published,
            subscriptions,
        })
    }

    /// Tables in generation order (upstream first).
    pub fn generation_order(&self) -> &[String] {
        &self.order
    }

    /// Tables in dependency order (dependents first).
    pub fn dependency_order(&self) -> Vec<String> {
        self.order.iter().rev().cloned().collect()
    }

    /// Columns of `table` that some other table consumes.
    pub fn published_columns(&self, table: &str) -> &[String] {
        self.published
            .get(table)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every stream that has at least one consumer.
    pub fn stream_keys(&self) -> Vec<StreamKey> {
        self.published
            .iter()
            .flat_map(|(table, columns)| {
                columns.iter().map(move |c| StreamKey::new(table, c))
            })
            .collect()
    }

    /// All subscriptions.
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Subscriptions held by `table`.
    pub fn subscriptions_of<'a>(
        &'a self,
        table: &'a str,
    ) -> impl Iterator<Item = &'a Subscription> + 'a {
        self.subscriptions.iter().filter(move |s| s.table == table)
    }

    /// Tables `table` reads from, in reference order.
    pub fn upstream_of(&self, table: &str) -> Vec<&str> {
        let mut upstream: Vec<&str> = Vec::new();
        for (target, _) in self.graph.adjacent(&table.to_string()) {
            if !upstream.contains(&target.as_str()) {
                upstream.push(target.as_str());
            }
        }
        upstream
    }
}
