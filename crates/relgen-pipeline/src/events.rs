//! Lifecycle events emitted by producers and the orchestrator.

use crate::metrics::PipelineOutcome;
use std::time::Duration;

/// Lifecycle event of one table producer.
#[derive(Debug, Clone, PartialEq)]
pub enum ProducerEvent {
    /// The producer began; carries its output destination.
    Started { table: String, destination: String },
    /// All rows produced.
    Completed {
        table: String,
        rows: u64,
        elapsed: Duration,
    },
    /// The producer stopped on its own error.
    Failed {
        table: String,
        error: String,
        rows: u64,
    },
    /// The producer stopped because the pipeline was cancelled.
    Cancelled { table: String, rows: u64 },
}

impl ProducerEvent {
    pub fn table(&self) -> &str {
        match self {
            ProducerEvent::Started { table, .. }
            | ProducerEvent::Completed { table, .. }
            | ProducerEvent::Failed { table, .. }
            | ProducerEvent::Cancelled { table, .. } => table,
        }
    }

    /// Whether this is the producer's last event.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProducerEvent::Started { .. })
    }
}

/// Event on the pipeline's event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A producer lifecycle event.
    Table(ProducerEvent),
    /// Every producer is terminal; emitted once, last.
    Finished(PipelineOutcome),
}
