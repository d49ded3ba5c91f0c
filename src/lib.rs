//! relgen Library
//!
//! Generates rows for a set of related tables so that every reference column
//! only holds values its upstream table actually produced.
//!
//! # Crates
//!
//! - `relgen_core` - schema, values and row counts
//! - `relgen_graph` - dependency order from column references
//! - `relgen_generator` - column value generators
//! - `relgen_bus` - topics and cross-table buffers
//! - `relgen_pipeline` - table producers and the orchestrator
//!
//! # CLI Usage
//!
//! ```bash
//! # Generate CSV files for every table
//! relgen generate --schema shop.yaml --output-dir out/ --seed 42
//!
//! # Print the generation order
//! relgen order --schema shop.yaml
//!
//! # Check a schema without generating anything
//! relgen validate --schema shop.yaml
//! ```

pub mod cli;
pub mod commands;
pub mod csv_sink;

pub use cli::{Cli, Commands, GenerateArgs};
pub use commands::{generate, load_schema, order, validate};
pub use csv_sink::{CsvSink, CsvSinkFactory};
