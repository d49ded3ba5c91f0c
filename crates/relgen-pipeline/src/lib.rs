//! Table producers and pipeline orchestration for relgen.
//!
//! The [`Orchestrator`] turns a [`relgen_core::Schema`] into one
//! [`TableProducer`] per table, wires referenced columns through the topic
//! bus, and runs every producer concurrently until each reaches a terminal
//! state. Progress is reported as [`PipelineEvent`]s and summarized in a
//! [`PipelineOutcome`].
//!
//! # Example
//!
//! ```rust,no_run
//! use relgen_core::Schema;
//! use relgen_pipeline::{MemorySinkFactory, Orchestrator, PipelineConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::from_file("shop.yaml")?;
//! let config = PipelineConfig::from_schema(&schema);
//! let sinks = MemorySinkFactory::new();
//!
//! let outcome = Orchestrator::new(schema, config, Arc::new(sinks.clone()))
//!     .run()
//!     .await?;
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod producer;
pub mod reference;
pub mod sink;

pub use config::PipelineConfig;
pub use error::{PipelineError, SinkError};
pub use events::{PipelineEvent, ProducerEvent};
pub use metrics::{rows_per_second, PipelineOutcome, TableMetrics, TableStatus};
pub use orchestrator::Orchestrator;
pub use producer::{ProducerWiring, TableProducer};
pub use reference::RefGenerator;
pub use sink::{MemorySink, MemorySinkFactory, RowSink, SinkFactory};
