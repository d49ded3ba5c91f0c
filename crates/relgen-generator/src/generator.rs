//! The value generator trait and the factory that builds one per column.

use crate::error::GeneratorError;
use crate::expression::{ExpressionEvaluator, Registry, TemplateEvaluator};
use crate::generators::{
    BatchedIdGenerator, ConstantGenerator, ExpressionGenerator, RangeGenerator, UuidGenerator,
    ValueSetGenerator,
};
use crate::identifier::{BatchRequest, CounterSource, IdentifierSource};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use relgen_core::{Column, ColumnSource, Gen, GenType, Schema, Value, ValueType};
use std::sync::Arc;
use tracing::debug;

/// A stateful producer of column values, polled once per row.
#[async_trait]
pub trait ValueGenerator: Send {
    /// Produce the next value.
    async fn next_value(&mut self) -> Result<Value, GeneratorError>;
}

/// Shared state every generator of a run is built from.
#[derive(Clone)]
pub struct GeneratorContext {
    /// Evaluator for expression columns
    pub evaluator: Arc<dyn ExpressionEvaluator>,
    /// Variables and functions visible to expressions
    pub registry: Arc<Registry>,
    /// Counters for `sequence` and row-id columns
    pub local_ids: Arc<CounterSource>,
    /// Source for `database_sequence` columns
    pub database_ids: Option<Arc<dyn IdentifierSource>>,
    /// Base seed for reproducible random columns
    pub seed: Option<u64>,
}

impl Default for GeneratorContext {
    fn default() -> Self {
        Self {
            evaluator: Arc::new(TemplateEvaluator),
            registry: Arc::new(Registry::with_builtins()),
            local_ids: Arc::new(CounterSource::new()),
            database_ids: None,
            seed: None,
        }
    }
}

impl GeneratorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn with_database_ids(mut self, source: Arc<dyn IdentifierSource>) -> Self {
        self.database_ids = Some(source);
        self
    }

    /// RNG for one column; seeded runs give every column its own stream.
    pub fn rng_for(&self, table: &str, column: &str) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(column_seed(seed, table, column)),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Seed of one column's random stream: FNV-1a over `table.column`, mixed
/// into the base seed.
pub fn column_seed(seed: u64, table: &str, column: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in table.bytes().chain([b'.']).chain(column.bytes()) {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    seed ^ hash.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Build the generator for a non-reference column of `table`.
pub fn build_generator(
    table: &str,
    column: &Column,
    ctx: &GeneratorContext,
) -> Result<Box<dyn ValueGenerator>, GeneratorError> {
    let source = column
        .source()
        .ok_or_else(|| GeneratorError::MissingSource(column.name.clone()))?;
    debug!("Building {} generator for {table}.{}", source.name(), column.name);

    match source {
        ColumnSource::Reference(_) => Err(GeneratorError::ReferenceColumn(column.name.clone())),

        ColumnSource::Range(range) => Ok(Box::new(RangeGenerator::new(&column.name, &range)?)),

        ColumnSource::Identity(gen) => build_identity(table, column, &gen, ctx),

        ColumnSource::Constant(literal) => {
            let value =
                Schema::literal(column, &literal).map_err(|source| GeneratorError::Literal {
                    column: column.name.clone(),
                    source,
                })?;
            Ok(Box::new(ConstantGenerator::new(value)))
        }

        ColumnSource::Expression(expression) => Ok(Box::new(ExpressionGenerator::new(
            column.name.clone(),
            expression,
            column.data_type.unwrap_or(ValueType::Text),
            ctx.evaluator.clone(),
            ctx.registry.clone(),
        )?)),

        ColumnSource::Set(set) => Ok(Box::new(ValueSetGenerator::new(
            column,
            &set,
            ctx.rng_for(table, &column.name),
        )?)),
    }
}

fn build_identity(
    table: &str,
    column: &Column,
    gen: &Gen,
    ctx: &GeneratorContext,
) -> Result<Box<dyn ValueGenerator>, GeneratorError> {
    let invalid = |reason: &str| GeneratorError::InvalidIdentity {
        column: column.name.clone(),
        reason: reason.to_string(),
    };

    if gen.kind == GenType::Uuid {
        return Ok(Box::new(UuidGenerator::new(
            ctx.rng_for(table, &column.name),
        )));
    }

    let start = gen.from.unwrap_or(1);
    let step = gen.step.unwrap_or(1);
    if step == 0 {
        return Err(invalid("step must not be zero"));
    }
    if gen.batch_size == 0 {
        return Err(invalid("batch_size must be positive"));
    }
    if let Some(to) = gen.to {
        if (step > 0 && to < start) || (step < 0 && to > start) {
            return Err(invalid("'to' is unreachable from 'from'"));
        }
    }

    let (key, source): (String, Arc<dyn IdentifierSource>) = match gen.kind {
        GenType::DatabaseSequence => {
            let sequence = gen
                .sequence
                .clone()
                .ok_or_else(|| invalid("database_sequence requires a 'sequence' name"))?;
            let source = ctx
                .database_ids
                .clone()
                .ok_or_else(|| GeneratorError::SourceUnavailable(sequence.clone()))?;
            (sequence, source)
        }
        // A named sequence shares its counter across columns.
        _ => (
            gen.sequence
                .clone()
                .unwrap_or_else(|| format!("{table}.{}", column.name)),
            ctx.local_ids.clone(),
        ),
    };

    let request = BatchRequest {
        key,
        size: gen.batch_size,
        start,
        step,
    };
    let mut generator = BatchedIdGenerator::new(request, source).with_limit(gen.to);
    if gen.kind == GenType::UnorderedRowId {
        generator = generator.scrambled();
    }
    Ok(Box::new(generator))
}
