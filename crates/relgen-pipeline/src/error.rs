//! Error types for the pipeline.

use relgen_bus::BusError;
use relgen_core::ConfigError;
use relgen_generator::GeneratorError;
use relgen_graph::TopologyError;
use thiserror::Error;

/// Errors raised by a row sink.
#[derive(Error, Debug)]
pub enum SinkError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding error.
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Row does not match the sink's columns.
    #[error("Row has {actual} values, expected {expected}")]
    RowShape { expected: usize, actual: usize },
}

/// Errors that can occur while building or running a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Schema or reference graph rejected.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Schema error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Column generator could not be built.
    #[error("Failed to build generator for {table}.{column}: {source}")]
    Generator {
        table: String,
        column: String,
        #[source]
        source: GeneratorError,
    },

    /// Row generation failed.
    #[error("Row generation failed for table '{table}': {source}")]
    Row {
        table: String,
        #[source]
        source: GeneratorError,
    },

    /// Output failed.
    #[error("Sink error for table '{table}': {source}")]
    Sink {
        table: String,
        #[source]
        source: SinkError,
    },

    /// Publishing to a downstream topic failed.
    #[error("Publish failed for table '{table}': {source}")]
    Publish {
        table: String,
        #[source]
        source: BusError,
    },
}
