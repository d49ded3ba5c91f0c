//! Pipeline orchestration: wiring, spawning and supervising table producers.

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::events::{PipelineEvent, ProducerEvent};
use crate::metrics::{PipelineOutcome, TableMetrics, TableStatus};
use crate::producer::{ProducerWiring, TableProducer};
use crate::sink::SinkFactory;
use relgen_bus::{buffer_for, BufferListener, TopicRegistry};
use relgen_core::{ConfigError, Schema};
use relgen_generator::{column_seed, GeneratorContext};
use relgen_graph::Topology;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Runs every table of a schema to a terminal state.
///
/// All topics and consumer buffers are registered before the first producer
/// starts. Producers are spawned in generation order and run concurrently.
/// The first failure cancels the pipeline-wide token, after which every other
/// producer ends `Cancelled`.
pub struct Orchestrator {
    schema: Schema,
    config: PipelineConfig,
    sinks: Arc<dyn SinkFactory>,
    context: GeneratorContext,
    events: Option<mpsc::UnboundedSender<PipelineEvent>>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Progress {
    destination: String,
    started: Option<Instant>,
    terminal: Option<ProducerEvent>,
}

impl Orchestrator {
    pub fn new(schema: Schema, config: PipelineConfig, sinks: Arc<dyn SinkFactory>) -> Self {
        let context = GeneratorContext::new().with_seed(config.seed);
        Self {
            schema,
            config,
            sinks,
            context,
            events: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Use a custom generator context (evaluator, registry, identifier
    /// sources). The configured seed, if any, still applies.
    pub fn with_generator_context(mut self, context: GeneratorContext) -> Self {
        self.context = if self.config.seed.is_some() {
            context.with_seed(self.config.seed)
        } else {
            context
        };
        self
    }

    /// Forward lifecycle events to `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<PipelineEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Token that stops the whole pipeline when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn forward(&self, event: PipelineEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    /// Run the pipeline and return its outcome.
    ///
    /// Errors are returned only when the pipeline cannot be built; failures
    /// while running are reported in the outcome.
    pub async fn run(self) -> Result<PipelineOutcome, PipelineError> {
        let start_time = Instant::now();
        let topology = Topology::build(&self.schema)?;
        let order = topology.generation_order().to_vec();
        info!("Generation order: {}", order.join(" -> "));

        let settings = &self.config.settings;
        let registry = TopicRegistry::new(settings.queue_capacity, self.cancel.clone());

        let mut topics: HashMap<String, ProducerWiring> = HashMap::new();
        for key in topology.stream_keys() {
            let topic = registry.get_or_create(&key);
            topics
                .entry(key.table.clone())
                .or_insert_with(empty_wiring)
                .topics
                .insert(key.column.clone(), topic);
        }

        for subscription in topology.subscriptions() {
            let seed = self
                .config
                .seed
                .map(|seed| column_seed(seed, &subscription.table, &subscription.column));
            let buffer = buffer_for(subscription.policy, settings, seed);
            if let Some(topic) = registry.get(&subscription.key) {
                topic.add_listener(Arc::new(BufferListener::new(buffer.clone())));
            }
            debug!(
                "{}.{} subscribes to '{}' ({:?})",
                subscription.table, subscription.column, subscription.key, subscription.policy
            );
            topics
                .entry(subscription.table.clone())
                .or_insert_with(empty_wiring)
                .inputs
                .insert(
                    subscription.column.clone(),
                    (subscription.key.clone(), buffer),
                );
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut producers = Vec::with_capacity(order.len());
        for name in &order {
            let built = self.build_producer(name, topics.remove(name), tx.clone());
            match built {
                Ok(producer) => producers.push(producer),
                Err(e) => {
                    error!("Failed to build producer for table '{name}': {e}");
                    self.cancel.cancel();
                    registry.shutdown().await;
                    return Err(e);
                }
            }
        }

        let mut supervisors: Vec<JoinHandle<()>> = Vec::with_capacity(producers.len());
        for producer in producers {
            supervisors.push(supervise(producer, tx.clone()));
        }
        drop(tx);

        let mut progress: HashMap<String, Progress> = HashMap::new();
        let mut remaining = order.len();
        while remaining > 0 {
            let Some(event) = rx.recv().await else {
                break;
            };
            let entry = progress.entry(event.table().to_string()).or_default();
            match &event {
                ProducerEvent::Started { destination, .. } => {
                    entry.destination = destination.clone();
                    entry.started = Some(Instant::now());
                }
                ProducerEvent::Failed { table, error, .. } => {
                    if !self.cancel.is_cancelled() {
                        warn!("Table '{table}' failed, cancelling pipeline: {error}");
                        self.cancel.cancel();
                    }
                }
                _ => {}
            }
            if event.is_terminal() && entry.terminal.is_none() {
                entry.terminal = Some(event.clone());
                remaining -= 1;
            }
            self.forward(PipelineEvent::Table(event));
        }

        for supervisor in supervisors {
            if let Err(e) = supervisor.await {
                error!("Producer supervisor failed: {e}");
            }
        }
        registry.shutdown().await;

        let tables: Vec<TableMetrics> = order
            .iter()
            .map(|name| table_metrics(name, progress.remove(name).unwrap_or_default()))
            .collect();
        let outcome = PipelineOutcome {
            success: tables.iter().all(TableMetrics::is_completed),
            exit_process: settings.exit_on_completion,
            tables,
            elapsed: start_time.elapsed(),
        };

        if outcome.success {
            info!("{}", outcome.summary());
        } else {
            error!("{}", outcome.summary());
        }
        self.forward(PipelineEvent::Finished(outcome.clone()));
        Ok(outcome)
    }

    fn build_producer(
        &self,
        name: &str,
        wiring: Option<ProducerWiring>,
        events: mpsc::UnboundedSender<ProducerEvent>,
    ) -> Result<TableProducer, PipelineError> {
        let table = self
            .schema
            .get_table(name)
            .ok_or_else(|| ConfigError::TableNotFound(name.to_string()))?;
        let sink = self
            .sinks
            .open(table)
            .map_err(|source| PipelineError::Sink {
                table: name.to_string(),
                source,
            })?;
        TableProducer::build(
            table,
            wiring.unwrap_or_else(empty_wiring),
            &self.context,
            sink,
            self.cancel.clone(),
            events,
        )
    }
}

fn empty_wiring() -> ProducerWiring {
    ProducerWiring {
        topics: HashMap::new(),
        inputs: HashMap::new(),
    }
}

/// Spawn a producer and report a panic as a failure.
fn supervise(
    producer: TableProducer,
    events: mpsc::UnboundedSender<ProducerEvent>,
) -> JoinHandle<()> {
    let table = producer.table().to_string();
    let handle = tokio::spawn(producer.run());
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            error!("Producer for table '{table}' panicked: {e}");
            let _ = events.send(ProducerEvent::Failed {
                table,
                error: format!("producer task failed: {e}"),
                rows: 0,
            });
        }
    })
}

fn table_metrics(name: &str, progress: Progress) -> TableMetrics {
    let since_start = progress
        .started
        .map(|started| started.elapsed())
        .unwrap_or(Duration::ZERO);
    let (rows, elapsed, status) = match progress.terminal {
        Some(ProducerEvent::Completed { rows, elapsed, .. }) => {
            (rows, elapsed, TableStatus::Completed)
        }
        Some(ProducerEvent::Failed { rows, error, .. }) => {
            (rows, since_start, TableStatus::Failed(error))
        }
        Some(ProducerEvent::Cancelled { rows, .. }) => (rows, since_start, TableStatus::Cancelled),
        _ => (0, since_start, TableStatus::Cancelled),
    };
    TableMetrics {
        table: name.to_string(),
        destination: progress.destination,
        rows,
        elapsed,
        status,
    }
}
