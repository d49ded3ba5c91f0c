//! Sequence and row-id generators backed by batched identifier sources.

use crate::error::GeneratorError;
use crate::generator::ValueGenerator;
use crate::identifier::{BatchRequest, IdentifierSource, SourceError};
use async_trait::async_trait;
use relgen_core::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

const MASK_63: u64 = (1 << 63) - 1;

/// Map an identifier onto a scrambled, still unique, non-negative id.
///
/// Each step is a bijection on 63-bit integers, so distinct inputs in
/// `0..=i64::MAX` stay distinct.
pub fn scramble(id: i64) -> i64 {
    let mut x = (id as u64) & MASK_63;
    x = x.wrapping_mul(0x9E37_79B9_7F4A_7C15) & MASK_63;
    x ^= x >> 31;
    x = x.wrapping_mul(0xBF58_476D_1CE4_E5B9) & MASK_63;
    x ^= x >> 29;
    x as i64
}

/// Serves identifiers from a local buffer refilled in batches.
pub struct BatchedIdGenerator {
    request: BatchRequest,
    source: Arc<dyn IdentifierSource>,
    buffer: VecDeque<i64>,
    to: Option<i64>,
    scrambled: bool,
}

impl BatchedIdGenerator {
    pub fn new(request: BatchRequest, source: Arc<dyn IdentifierSource>) -> Self {
        Self {
            buffer: VecDeque::with_capacity(request.size),
            request,
            source,
            to: None,
            scrambled: false,
        }
    }

    /// Fail once identifiers pass `to` (inclusive bound).
    pub fn with_limit(mut self, to: Option<i64>) -> Self {
        self.to = to;
        self
    }

    /// Emit scrambled identifiers instead of the raw sequence.
    pub fn scrambled(mut self) -> Self {
        self.scrambled = true;
        self
    }

    async fn refill(&mut self) -> Result<(), GeneratorError> {
        let batch = self
            .source
            .next_batch(&self.request)
            .await
            .map_err(|source| GeneratorError::Source {
                key: self.request.key.clone(),
                source,
            })?;
        if batch.is_empty() {
            return Err(GeneratorError::Source {
                key: self.request.key.clone(),
                source: SourceError::EmptyBatch(self.request.key.clone()),
            });
        }
        trace!(
            "Refilled '{}' with {} identifiers",
            self.request.key,
            batch.len()
        );
        self.buffer.extend(batch);
        Ok(())
    }
}

#[async_trait]
impl ValueGenerator for BatchedIdGenerator {
    async fn next_value(&mut self) -> Result<Value, GeneratorError> {
        let id = match self.buffer.pop_front() {
            Some(id) => id,
            None => {
                self.refill().await?;
                self.buffer
                    .pop_front()
                    .ok_or_else(|| GeneratorError::Source {
                        key: self.request.key.clone(),
                        source: SourceError::EmptyBatch(self.request.key.clone()),
                    })?
            }
        };

        if let Some(to) = self.to {
            let past = if self.request.step > 0 { id > to } else { id < to };
            if past {
                return Err(GeneratorError::SequenceExhausted {
                    key: self.request.key.clone(),
                    next: id,
                    to,
                });
            }
        }

        Ok(Value::Int(if self.scrambled { scramble(id) } else { id }))
    }
}
