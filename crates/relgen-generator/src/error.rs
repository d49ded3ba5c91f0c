//! Error types for value generation.

use crate::expression::EvalError;
use crate::identifier::SourceError;
use relgen_core::{StreamKey, ValueError};

/// Error type for generator construction and per-row generation.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// Column declares no value source
    #[error("Column '{0}' has no value source")]
    MissingSource(String),

    /// Reference columns are fed by their upstream stream
    #[error("Column '{0}' is a reference; its values come from the upstream stream")]
    ReferenceColumn(String),

    /// Range spec that cannot produce values
    #[error("Invalid range for column '{column}': {reason}")]
    InvalidRange { column: String, reason: String },

    /// Identity spec that cannot produce values
    #[error("Invalid identity generator for column '{column}': {reason}")]
    InvalidIdentity { column: String, reason: String },

    /// Value set that cannot produce values
    #[error("Invalid value set for column '{column}': {reason}")]
    InvalidValueSet { column: String, reason: String },

    /// Literal that does not fit the column type
    #[error("Invalid literal for column '{column}': {source}")]
    Literal {
        column: String,
        #[source]
        source: ValueError,
    },

    /// Expression rejected or failed to evaluate
    #[error("Expression error in column '{column}': {source}")]
    Expression {
        column: String,
        #[source]
        source: EvalError,
    },

    /// Identifier batch could not be read
    #[error("Identifier source failed for '{key}': {source}")]
    Source {
        key: String,
        #[source]
        source: SourceError,
    },

    /// Database sequence requested without a database source
    #[error("No database identifier source configured for sequence '{0}'")]
    SourceUnavailable(String),

    /// Bounded sequence ran past its last identifier
    #[error("Sequence '{key}' exhausted: next identifier {next} is past {to}")]
    SequenceExhausted { key: String, next: i64, to: i64 },

    /// Upstream stream ended
    #[error("Stream '{0}' is closed")]
    StreamClosed(StreamKey),
}
