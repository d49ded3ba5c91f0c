//! Expression column generator.

use crate::error::GeneratorError;
use crate::expression::{ExpressionEvaluator, Registry};
use crate::generator::ValueGenerator;
use async_trait::async_trait;
use relgen_core::{Value, ValueType};
use std::sync::Arc;

/// Evaluates a column expression once per row.
pub struct ExpressionGenerator {
    column: String,
    expression: String,
    expected: ValueType,
    evaluator: Arc<dyn ExpressionEvaluator>,
    registry: Arc<Registry>,
}

impl ExpressionGenerator {
    /// Create the generator, rejecting expressions the evaluator cannot run.
    pub fn new(
        column: impl Into<String>,
        expression: impl Into<String>,
        expected: ValueType,
        evaluator: Arc<dyn ExpressionEvaluator>,
        registry: Arc<Registry>,
    ) -> Result<Self, GeneratorError> {
        let column = column.into();
        let expression = expression.into();
        evaluator
            .check(&expression, &registry)
            .map_err(|source| GeneratorError::Expression {
                column: column.clone(),
                source,
            })?;

        Ok(Self {
            column,
            expression,
            expected,
            evaluator,
            registry,
        })
    }
}

#[async_trait]
impl ValueGenerator for ExpressionGenerator {
    async fn next_value(&mut self) -> Result<Value, GeneratorError> {
        self.evaluator
            .evaluate(&self.expression, self.expected, &self.registry)
            .map_err(|source| GeneratorError::Expression {
                column: self.column.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{EvalError, TemplateEvaluator};

    struct Fixed;

    impl ExpressionEvaluator for Fixed {
        fn evaluate(
            &self,
            expression: &str,
            expected: ValueType,
            _registry: &Registry,
        ) -> Result<Value, EvalError> {
            Ok(Value::Text(expression.len().to_string()).coerce(expected)?)
        }
    }

    #[tokio::test]
    async fn test_custom_evaluator() {
        let mut generator = ExpressionGenerator::new(
            "len",
            "abcd",
            ValueType::Int,
            Arc::new(Fixed),
            Arc::new(Registry::new()),
        )
        .unwrap();
        assert_eq!(generator.next_value().await.unwrap(), Value::Int(4));
    }

    #[tokio::test]
    async fn test_template_per_row() {
        let mut generator = ExpressionGenerator::new(
            "code",
            "ORD-{seq:orders}",
            ValueType::Text,
            Arc::new(TemplateEvaluator),
            Arc::new(Registry::with_builtins()),
        )
        .unwrap();
        assert_eq!(
            generator.next_value().await.unwrap(),
            Value::Text("ORD-1".into())
        );
        assert_eq!(
            generator.next_value().await.unwrap(),
            Value::Text("ORD-2".into())
        );
    }

    #[test]
    fn test_invalid_expression_rejected_at_construction() {
        let result = ExpressionGenerator::new(
            "code",
            "{nope}",
            ValueType::Text,
            Arc::new(TemplateEvaluator),
            Arc::new(Registry::with_builtins()),
        );
        assert!(matches!(
            result,
            Err(GeneratorError::Expression { ref column, .. }) if column == "code"
        ));
    }
}
