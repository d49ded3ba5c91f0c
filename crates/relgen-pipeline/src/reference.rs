//! Generator for reference columns, fed from an upstream stream.

use async_trait::async_trait;
use relgen_bus::ValueBuffer;
use relgen_core::{StreamKey, Value};
use relgen_generator::{GeneratorError, ValueGenerator};
use std::sync::Arc;

/// Reads a reference column's values from its buffer.
pub struct RefGenerator {
    key: StreamKey,
    buffer: Arc<dyn ValueBuffer>,
}

impl RefGenerator {
    pub fn new(key: StreamKey, buffer: Arc<dyn ValueBuffer>) -> Self {
        Self { key, buffer }
    }
}

#[async_trait]
impl ValueGenerator for RefGenerator {
    async fn next_value(&mut self) -> Result<Value, GeneratorError> {
        self.buffer
            .take()
            .await
            .ok_or_else(|| GeneratorError::StreamClosed(self.key.clone()))
    }
}
