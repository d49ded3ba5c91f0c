//! Constant value generator.

use crate::error::GeneratorError;
use crate::generator::ValueGenerator;
use async_trait::async_trait;
use relgen_core::Value;

/// Produces the same value for every row.
#[derive(Debug, Clone)]
pub struct ConstantGenerator {
    value: Value,
}

impl ConstantGenerator {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

#[async_trait]
impl ValueGenerator for ConstantGenerator {
    async fn next_value(&mut self) -> Result<Value, GeneratorError> {
        Ok(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_constant_repeats() {
        let mut generator = ConstantGenerator::new(Value::Text("active".into()));
        for _ in 0..3 {
            assert_eq!(
                generator.next_value().await.unwrap(),
                Value::Text("active".into())
            );
        }
    }
}
