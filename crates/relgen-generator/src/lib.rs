//! Column value generators for relgen.
//!
//! Every non-reference column gets one [`ValueGenerator`], built by
//! [`build_generator`] from the column's resolved source:
//!
//! | Source       | Generator                |
//! |--------------|--------------------------|
//! | `range`      | [`RangeGenerator`]       |
//! | `gen`        | [`UuidGenerator`] / [`BatchedIdGenerator`] |
//! | `constant`   | [`ConstantGenerator`]    |
//! | `expression` | [`ExpressionGenerator`]  |
//! | `set`        | [`ValueSetGenerator`]    |
//!
//! Reference columns are fed by the pipeline from upstream streams.
//!
//! # Example
//!
//! ```rust
//! use relgen_core::{Column, Gen, GenType, Value};
//! use relgen_generator::{build_generator, GeneratorContext};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let mut column = Column::new("id");
//!     column.gen = Some(Gen {
//!         kind: GenType::Sequence,
//!         from: Some(10),
//!         to: None,
//!         step: None,
//!         sequence: None,
//!         batch_size: 100,
//!     });
//!
//!     let ctx = GeneratorContext::new();
//!     let mut generator = build_generator("orders", &column, &ctx).unwrap();
//!     assert_eq!(generator.next_value().await.unwrap(), Value::Int(10));
//!     assert_eq!(generator.next_value().await.unwrap(), Value::Int(11));
//! });
//! ```

pub mod error;
pub mod expression;
pub mod generator;
pub mod generators;
pub mod identifier;

pub use error::GeneratorError;
pub use expression::{EvalError, ExpressionEvaluator, Registry, RegistryFn, TemplateEvaluator};
pub use generator::{build_generator, column_seed, GeneratorContext, ValueGenerator};
pub use generators::{
    BatchedIdGenerator, ConstantGenerator, ExpressionGenerator, RangeGenerator, UuidGenerator,
    ValueSetGenerator,
};
pub use identifier::{
    BatchRequest, CounterSource, IdentifierSource, PostgresSequenceSource, SourceError,
};
