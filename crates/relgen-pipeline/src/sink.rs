//! Row sinks: where a producer writes its visible columns.

use crate::error::SinkError;
use relgen_core::{Table, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Destination of one table's rows.
pub trait RowSink: Send {
    /// Human-readable destination, reported in the `Started` event.
    fn destination(&self) -> String;

    /// Write one row of visible values, in column order.
    fn write_row(&mut self, row: &[Value]) -> Result<(), SinkError>;

    /// Flush and close.
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Opens one sink per table.
pub trait SinkFactory: Send + Sync {
    fn open(&self, table: &Table) -> Result<Box<dyn RowSink>, SinkError>;
}

type Rows = Arc<Mutex<BTreeMap<String, Vec<Vec<Value>>>>>;

fn lock(rows: &Rows) -> MutexGuard<'_, BTreeMap<String, Vec<Vec<Value>>>> {
    rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps every table's rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySinkFactory {
    rows: Rows,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written for `table` so far.
    pub fn rows(&self, table: &str) -> Vec<Vec<Value>> {
        lock(&self.rows).get(table).cloned().unwrap_or_default()
    }

    /// Values of one visible column, by position.
    pub fn column(&self, table: &str, index: usize) -> Vec<Value> {
        lock(&self.rows)
            .get(table)
            .map(|rows| rows.iter().filter_map(|r| r.get(index).cloned()).collect())
            .unwrap_or_default()
    }
}

impl SinkFactory for MemorySinkFactory {
    fn open(&self, table: &Table) -> Result<Box<dyn RowSink>, SinkError> {
        lock(&self.rows).insert(table.name.clone(), Vec::new());
        Ok(Box::new(MemorySink {
            table: table.name.clone(),
            width: table.visible_columns().count(),
            rows: self.rows.clone(),
        }))
    }
}

/// In-memory sink opened by [`MemorySinkFactory`].
#[derive(Debug)]
pub struct MemorySink {
    table: String,
    width: usize,
    rows: Rows,
}

impl RowSink for MemorySink {
    fn destination(&self) -> String {
        format!("memory:{}", self.table)
    }

    fn write_row(&mut self, row: &[Value]) -> Result<(), SinkError> {
        if row.len() != self.width {
            return Err(SinkError::RowShape {
                expected: self.width,
                actual: row.len(),
            });
        }
        lock(&self.rows)
            .entry(self.table.clone())
            .or_default()
            .push(row.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
