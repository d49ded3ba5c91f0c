//! End-to-end pipeline runs over in-memory sinks.

use relgen_core::{Schema, Table, Value};
use relgen_pipeline::{
    MemorySinkFactory, Orchestrator, PipelineConfig, PipelineError, PipelineEvent, ProducerEvent,
    RowSink, SinkError, SinkFactory, TableStatus,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const SHOP: &str = r#"
tables:
  - name: order_item
    count: 100
    columns:
      - name: order_id
        ref: { table: orders, column: id }
      - name: qty
        set: { values: [1, 2, 3] }
  - name: orders
    columns:
      - name: id
        gen: { type: sequence, from: 1000 }
      - name: customer_id
        ref: { table: customer, column: id }
        each: { multiplier: 3 }
      - name: status
        constant: new
  - name: customer
    count: 20
    columns:
      - name: id
        gen: { type: sequence }
      - name: secret
        constant: hunter2
        hidden: true
      - name: tier
        set: { values: [gold, silver], weights: [1, 3] }
"#;

fn ints(values: Vec<Value>) -> Vec<i64> {
    values.iter().map(|v| v.as_i64().unwrap()).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shop_schema() {
    let schema = Schema::from_yaml(SHOP).unwrap();
    let config = PipelineConfig::from_schema(&schema).with_seed(Some(11));
    let sinks = MemorySinkFactory::new();

    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        Orchestrator::new(schema, config, Arc::new(sinks.clone())).run(),
    )
    .await
    .expect("pipeline timed out")
    .unwrap();

    assert!(outcome.success, "{}", outcome.summary());
    let order: Vec<&str> = outcome.tables.iter().map(|t| t.table.as_str()).collect();
    assert_eq!(order, vec!["customer", "orders", "order_item"]);

    // Hidden column is published but not written.
    let customers = sinks.rows("customer");
    assert_eq!(customers.len(), 20);
    assert!(customers.iter().all(|row| row.len() == 2));
    assert_eq!(ints(sinks.column("customer", 0)), (1..=20).collect::<Vec<_>>());

    // Unbounded orders stop when the exact customer stream ends: 20 x 3.
    let orders = sinks.rows("orders");
    assert_eq!(orders.len(), 60);
    assert_eq!(outcome.table("orders").unwrap().rows, 60);
    let mut per_customer: HashMap<i64, usize> = HashMap::new();
    for customer_id in ints(sinks.column("orders", 1)) {
        *per_customer.entry(customer_id).or_default() += 1;
    }
    assert_eq!(per_customer.len(), 20);
    assert!(per_customer.values().all(|n| *n == 3));
    assert_eq!(
        ints(sinks.column("orders", 1)),
        (1..=20).flat_map(|id| [id; 3]).collect::<Vec<_>>()
    );

    // Sampled references only ever see published order ids.
    let order_ids: HashSet<i64> = ints(sinks.column("orders", 0)).into_iter().collect();
    let items = sinks.column("order_item", 0);
    assert_eq!(items.len(), 100);
    assert!(ints(items).iter().all(|id| order_ids.contains(id)));

    assert_eq!(outcome.total_rows(), 180);
    assert!(outcome.exit_process);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_cancels_pipeline() {
    let schema = Schema::from_yaml(
        r#"
tables:
  - name: parent
    count: 10
    columns:
      - name: id
        gen: { type: sequence, from: 1, to: 5 }
  - name: child
    count: 100
    columns:
      - name: parent_id
        ref: { table: parent, column: id, policy: exact }
"#,
    )
    .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let sinks = MemorySinkFactory::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        Orchestrator::new(schema, PipelineConfig::new(), Arc::new(sinks.clone()))
            .with_events(tx)
            .run(),
    )
    .await
    .expect("pipeline timed out")
    .unwrap();

    assert!(!outcome.success);
    let parent = outcome.table("parent").unwrap();
    assert_eq!(parent.rows, 5);
    assert!(matches!(&parent.status, TableStatus::Failed(e) if e.contains("exhausted")));

    let child = outcome.table("child").unwrap();
    assert_eq!(child.status, TableStatus::Cancelled);
    assert!(child.rows <= 5);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert!(matches!(events.last(), Some(PipelineEvent::Finished(o)) if !o.success));
    for table in ["parent", "child"] {
        let table_events: Vec<&ProducerEvent> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Table(event) if event.table() == table => Some(event),
                _ => None,
            })
            .collect();
        assert_eq!(table_events.len(), 2, "{table}: {table_events:?}");
        assert!(matches!(table_events[0], ProducerEvent::Started { .. }));
        assert!(table_events[1].is_terminal());
    }
}

struct CountingSinks(Arc<AtomicU64>);

struct CountingSink(Arc<AtomicU64>);

impl SinkFactory for CountingSinks {
    fn open(&self, _table: &Table) -> Result<Box<dyn RowSink>, SinkError> {
        Ok(Box::new(CountingSink(self.0.clone())))
    }
}

impl RowSink for CountingSink {
    fn destination(&self) -> String {
        "counter".to_string()
    }

    fn write_row(&mut self, _row: &[Value]) -> Result<(), SinkError> {
        self.0.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_external_cancel_stops_unbounded_table() {
    let schema = Schema::from_yaml(
        r#"
tables:
  - name: ticks
    columns:
      - name: id
        gen: { type: ordered_row_id }
      - name: label
        expression: "tick-{seq:ticks}"
"#,
    )
    .unwrap();

    let rows = Arc::new(AtomicU64::new(0));
    let orchestrator = Orchestrator::new(
        schema,
        PipelineConfig::new(),
        Arc::new(CountingSinks(rows.clone())),
    );
    let cancel = orchestrator.cancellation_token();
    let run = tokio::spawn(orchestrator.run());

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(10), run)
        .await
        .expect("pipeline did not stop")
        .unwrap()
        .unwrap();

    assert!(!outcome.success);
    let ticks = outcome.table("ticks").unwrap();
    assert_eq!(ticks.status, TableStatus::Cancelled);
    assert_eq!(ticks.rows, rows.load(Ordering::Relaxed));
    assert_eq!(ticks.destination, "counter");
}

/// Two paths from `a` into `c`. The exact buffers hold the whole fan-out, so
/// the shared `a.id` topic never blocks on one slow listener.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_diamond_with_ample_buffers() {
    let schema = Schema::from_yaml(
        r#"
tables:
  - name: c
    columns:
      - name: a_id
        ref: { table: a, column: id, policy: exact }
      - name: b_x
        ref: { table: b, column: x, policy: exact }
  - name: b
    columns:
      - name: a_id
        ref: { table: a, column: id }
        each: { multiplier: 10 }
      - name: x
        gen: { type: sequence }
  - name: a
    count: 200
    columns:
      - name: id
        gen: { type: sequence }
"#,
    )
    .unwrap();

    let config = PipelineConfig::from_schema(&schema)
        .with_queue_capacity(100_000)
        .with_exact_buffer_capacity(100_000);
    let sinks = MemorySinkFactory::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(30),
        Orchestrator::new(schema, config, Arc::new(sinks.clone())).run(),
    )
    .await
    .expect("pipeline timed out")
    .unwrap();

    assert!(outcome.success, "{}", outcome.summary());
    assert_eq!(outcome.table("a").unwrap().rows, 200);
    assert_eq!(outcome.table("b").unwrap().rows, 2000);
    assert_eq!(outcome.table("c").unwrap().rows, 200);
    assert_eq!(ints(sinks.column("c", 0)), (1..=200).collect::<Vec<_>>());
    assert_eq!(ints(sinks.column("c", 1)), (1..=200).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_cycle_rejected_before_start() {
    let schema = Schema::from_yaml(
        r#"
tables:
  - name: a
    count: 1
    columns:
      - { name: id, gen: { type: uuid } }
      - { name: b_id, ref: { table: b, column: id } }
  - name: b
    count: 1
    columns:
      - { name: id, gen: { type: uuid } }
      - { name: a_id, ref: { table: a, column: id } }
"#,
    )
    .unwrap();

    let sinks = MemorySinkFactory::new();
    let result = Orchestrator::new(schema, PipelineConfig::new(), Arc::new(sinks.clone()))
        .run()
        .await;

    assert!(matches!(result, Err(PipelineError::Topology(_))));
    assert!(sinks.rows("a").is_empty());
}

#[tokio::test]
async fn test_seeded_runs_are_reproducible() {
    let yaml = r#"
seed: 7
tables:
  - name: users
    count: 50
    columns:
      - name: id
        gen: { type: uuid }
      - name: role
        set: { values: [admin, user, guest], weights: [1, 5, 2] }
      - name: joined
        range: { type: date, from: "2024-01-01", to: "2024-12-31", step: 3 }
"#;

    let mut runs = Vec::new();
    for _ in 0..2 {
        let schema = Schema::from_yaml(yaml).unwrap();
        let config = PipelineConfig::from_schema(&schema);
        let sinks = MemorySinkFactory::new();
        let outcome = Orchestrator::new(schema, config, Arc::new(sinks.clone()))
            .run()
            .await
            .unwrap();
        assert!(outcome.success);
        runs.push(sinks.rows("users"));
    }

    assert_eq!(runs[0].len(), 50);
    assert_eq!(runs[0], runs[1]);
}
