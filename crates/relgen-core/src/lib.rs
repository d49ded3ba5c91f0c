//! Core types for the relgen row generation engine.
//!
//! This crate provides the foundational types shared by every other crate:
//!
//! - [`Schema`], [`Table`], [`Column`] - table definitions loaded from YAML
//! - [`ColumnSource`] - the resolved value source of a column
//! - [`Value`] / [`ValueType`] - generated values and declared column types
//! - [`RowCount`] - parsed target row counts (`"1.5M"`)
//! - [`StreamKey`] - identifier of a cross-table value stream
//!
//! # Architecture
//!
//! ```text
//! relgen-core (this crate)
//!    │
//!    ├─── relgen-graph      (dependency order from column references)
//!    ├─── relgen-generator  (column value generators)
//!    ├─── relgen-bus        (topics and cross-table buffers)
//!    └─── relgen-pipeline   (producers and orchestrator)
//! ```

pub mod row_count;
pub mod schema;
pub mod stream;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use row_count::{RowCount, RowCountSpec};
pub use schema::{
    BufferPolicy, Column, ColumnSource, ConfigError, Each, Gen, GenType, Range, RangeKind, Ref,
    Schema, Settings, StepUnit, Table, ValueSet,
};
pub use stream::StreamKey;
pub use types::ValueType;
pub use values::{parse_date, parse_datetime, parse_time, Value, ValueError};
