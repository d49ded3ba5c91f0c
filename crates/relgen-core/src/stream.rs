//! Identifiers for cross-table value streams.

use std::fmt;

/// Identifies the value stream published for one column of one table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey {
    /// Publishing table
    pub table: String,
    /// Published column
    pub column: String,
}

impl StreamKey {
    /// Create a new stream key.
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}
