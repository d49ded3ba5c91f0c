//! Table producer: generates one table's rows.

use crate::error::PipelineError;
use crate::events::ProducerEvent;
use crate::reference::RefGenerator;
use crate::sink::RowSink;
use relgen_bus::{Topic, ValueBuffer};
use relgen_core::{RowCount, StreamKey, Table, Value};
use relgen_generator::{build_generator, GeneratorContext, GeneratorError, ValueGenerator};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Rows produced between voluntary yields to the scheduler.
const YIELD_EVERY: u64 = 1024;

struct ColumnSlot {
    name: String,
    generator: Box<dyn ValueGenerator>,
    visible: bool,
}

enum Termination {
    Completed,
    StreamEnded(StreamKey),
    Cancelled,
}

/// Wiring a producer needs from the orchestrator.
pub struct ProducerWiring {
    /// Topic per published column name
    pub topics: HashMap<String, Arc<Topic>>,
    /// Input buffer per reference column name
    pub inputs: HashMap<String, (StreamKey, Arc<dyn ValueBuffer>)>,
}

/// Produces the rows of one table.
///
/// Columns are evaluated in declaration order. The `each` column's upstream
/// value is taken once and reused for `multiplier` consecutive rows. Values of
/// published columns go to their topics; visible columns go to the sink.
pub struct TableProducer {
    table: String,
    row_count: RowCount,
    columns: Vec<ColumnSlot>,
    each: Option<(usize, u64)>,
    publishers: Vec<(usize, Arc<Topic>)>,
    inputs: Vec<Arc<dyn ValueBuffer>>,
    sink: Box<dyn RowSink>,
    cancel: CancellationToken,
    events: mpsc::UnboundedSender<ProducerEvent>,
    rows: u64,
}

impl TableProducer {
    /// Build generators for every column of `table`.
    pub fn build(
        table: &Table,
        mut wiring: ProducerWiring,
        ctx: &GeneratorContext,
        sink: Box<dyn RowSink>,
        cancel: CancellationToken,
        events: mpsc::UnboundedSender<ProducerEvent>,
    ) -> Result<Self, PipelineError> {
        let mut columns = Vec::with_capacity(table.columns.len());
        let mut publishers = Vec::new();
        let mut inputs = Vec::new();
        let mut each = None;

        for (idx, column) in table.columns.iter().enumerate() {
            let generator: Box<dyn ValueGenerator> = match wiring.inputs.remove(&column.name) {
                Some((key, buffer)) => {
                    inputs.push(buffer.clone());
                    Box::new(RefGenerator::new(key, buffer))
                }
                None => build_generator(&table.name, column, ctx).map_err(|source| {
                    PipelineError::Generator {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        source,
                    }
                })?,
            };

            if let Some(spec) = &column.each {
                each = Some((idx, u64::from(spec.multiplier.max(1))));
            }
            if let Some(topic) = wiring.topics.remove(&column.name) {
                publishers.push((idx, topic));
            }

            columns.push(ColumnSlot {
                name: column.name.clone(),
                generator,
                visible: !column.hidden,
            });
        }

        Ok(Self {
            table: table.name.clone(),
            row_count: table.row_count()?,
            columns,
            each,
            publishers,
            inputs,
            sink,
            cancel,
            events,
            rows: 0,
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn emit(&self, event: ProducerEvent) {
        // The orchestrator may have stopped listening; the event is then moot.
        let _ = self.events.send(event);
    }

    /// Run to a terminal state, emitting lifecycle events.
    pub async fn run(mut self) -> ProducerEvent {
        let destination = self.sink.destination();
        info!("Producing table '{}' into {destination}", self.table);
        self.emit(ProducerEvent::Started {
            table: self.table.clone(),
            destination,
        });

        let start_time = Instant::now();
        let result = self.produce().await;
        let result = match result {
            Ok(Termination::Completed) => self.complete().await,
            Ok(Termination::StreamEnded(key)) => {
                info!(
                    "Input stream '{key}' of table '{}' ended after {} rows",
                    self.table, self.rows
                );
                self.complete().await
            }
            other => other,
        };

        for input in &self.inputs {
            input.release();
        }

        let event = match result {
            Ok(Termination::Cancelled) => {
                warn!(
                    "Table '{}' cancelled after {} rows",
                    self.table, self.rows
                );
                if let Err(e) = self.sink.finish() {
                    warn!("Failed to flush output of table '{}': {e}", self.table);
                }
                ProducerEvent::Cancelled {
                    table: self.table.clone(),
                    rows: self.rows,
                }
            }
            Ok(_) => {
                let elapsed = start_time.elapsed();
                info!(
                    "Table '{}' completed: {} rows in {:?} ({:.2} rows/sec)",
                    self.table,
                    self.rows,
                    elapsed,
                    crate::metrics::rows_per_second(self.rows, elapsed)
                );
                ProducerEvent::Completed {
                    table: self.table.clone(),
                    rows: self.rows,
                    elapsed,
                }
            }
            Err(e) => {
                error!("Table '{}' failed: {e}", self.table);
                ProducerEvent::Failed {
                    table: self.table.clone(),
                    error: e.to_string(),
                    rows: self.rows,
                }
            }
        };

        self.emit(event.clone());
        event
    }

    /// Flush the sink and end every published stream.
    async fn complete(&mut self) -> Result<Termination, PipelineError> {
        self.sink.finish().map_err(|source| PipelineError::Sink {
            table: self.table.clone(),
            source,
        })?;

        for (_, topic) in &self.publishers {
            tokio::select! {
                result = topic.close() => result.map_err(|source| PipelineError::Publish {
                    table: self.table.clone(),
                    source,
                })?,
                _ = self.cancel.cancelled() => return Ok(Termination::Cancelled),
            }
        }
        Ok(Termination::Completed)
    }

    async fn produce(&mut self) -> Result<Termination, PipelineError> {
        let visible = self.columns.iter().filter(|c| c.visible).count();
        let mut row: Vec<Value> = Vec::with_capacity(self.columns.len());
        let mut output: Vec<Value> = Vec::with_capacity(visible);
        let each = self.each;
        let mut driver: Option<Value> = None;

        while !self.row_count.is_reached(self.rows) {
            if self.cancel.is_cancelled() {
                return Ok(Termination::Cancelled);
            }

            row.clear();
            for idx in 0..self.columns.len() {
                let reused = match each {
                    Some((each_idx, multiplier)) if each_idx == idx => {
                        let refresh = self.rows % multiplier == 0;
                        driver.clone().filter(|_| !refresh)
                    }
                    _ => None,
                };
                let value = match reused {
                    Some(value) => value,
                    None => match self.next_value(idx).await? {
                        Next::Value(value) => value,
                        Next::Stop(termination) => return Ok(termination),
                    },
                };
                if matches!(each, Some((each_idx, _)) if each_idx == idx) {
                    driver = Some(value.clone());
                }
                row.push(value);
            }

            for (idx, topic) in &self.publishers {
                tokio::select! {
                    result = topic.publish(row[*idx].clone()) => {
                        result.map_err(|source| PipelineError::Publish {
                            table: self.table.clone(),
                            source,
                        })?
                    }
                    _ = self.cancel.cancelled() => return Ok(Termination::Cancelled),
                }
            }

            output.clear();
            output.extend(
                self.columns
                    .iter()
                    .zip(&row)
                    .filter(|(slot, _)| slot.visible)
                    .map(|(_, value)| value.clone()),
            );
            self.sink
                .write_row(&output)
                .map_err(|source| PipelineError::Sink {
                    table: self.table.clone(),
                    source,
                })?;

            self.rows += 1;
            if self.rows % YIELD_EVERY == 0 {
                debug!("Table '{}': {} rows", self.table, self.rows);
                tokio::task::yield_now().await;
            }
        }

        Ok(Termination::Completed)
    }

    async fn next_value(&mut self, idx: usize) -> Result<Next, PipelineError> {
        let slot = &mut self.columns[idx];
        let result = tokio::select! {
            result = slot.generator.next_value() => result,
            _ = self.cancel.cancelled() => return Ok(Next::Stop(Termination::Cancelled)),
        };

        match result {
            Ok(value) => Ok(Next::Value(value)),
            // A stream closed by cancellation is not the stream's natural end.
            Err(GeneratorError::StreamClosed(_)) if self.cancel.is_cancelled() => {
                Ok(Next::Stop(Termination::Cancelled))
            }
            Err(GeneratorError::StreamClosed(key)) => Ok(Next::Stop(Termination::StreamEnded(key))),
            Err(source) => {
                debug!("Column '{}' of table '{}' failed", slot.name, self.table);
                Err(PipelineError::Row {
                    table: self.table.clone(),
                    source,
                })
            }
        }
    }
}

enum Next {
    Value(Value),
    Stop(Termination),
}
