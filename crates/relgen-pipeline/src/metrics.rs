//! Per-table and pipeline metrics.

use std::time::Duration;

/// Rows per second over `elapsed`.
pub fn rows_per_second(rows: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        rows as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// Terminal state of one table producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableStatus {
    /// Reached its row count or the end of an exact input stream.
    Completed,
    /// Stopped on its own error.
    Failed(String),
    /// Stopped by the cancellation token.
    Cancelled,
}

/// Metrics collected for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetrics {
    /// Table name.
    pub table: String,
    /// Where rows were written.
    pub destination: String,
    /// Rows produced.
    pub rows: u64,
    /// Time from start to terminal state.
    pub elapsed: Duration,
    /// Terminal state.
    pub status: TableStatus,
}

impl TableMetrics {
    /// Calculate rows per second.
    pub fn rows_per_second(&self) -> f64 {
        rows_per_second(self.rows, self.elapsed)
    }

    pub fn is_completed(&self) -> bool {
        self.status == TableStatus::Completed
    }
}

/// Aggregate result of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Every table completed.
    pub success: bool,
    /// The host process should exit now.
    pub exit_process: bool,
    /// Per-table metrics in generation order.
    pub tables: Vec<TableMetrics>,
    /// Total pipeline duration.
    pub elapsed: Duration,
}

impl PipelineOutcome {
    /// Metrics of one table.
    pub fn table(&self, name: &str) -> Option<&TableMetrics> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Total rows across tables.
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|t| t.rows).sum()
    }

    /// Calculate overall rows per second.
    pub fn rows_per_second(&self) -> f64 {
        rows_per_second(self.total_rows(), self.elapsed)
    }

    /// Get a summary of the run.
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Pipeline {} in {:?}: {} rows ({:.2} rows/sec)",
            if self.success { "completed" } else { "failed" },
            self.elapsed,
            self.total_rows(),
            self.rows_per_second()
        );
        for table in &self.tables {
            let status = match &table.status {
                TableStatus::Completed => "completed".to_string(),
                TableStatus::Failed(error) => format!("failed: {error}"),
                TableStatus::Cancelled => "cancelled".to_string(),
            };
            summary.push_str(&format!(
                "\n  {}: {} rows in {:?} ({:.2} rows/sec) - {status}",
                table.table,
                table.rows,
                table.elapsed,
                table.rows_per_second()
            ));
        }
        summary
    }
}
