//! Value set generator: uniform or weighted choice among literals.

use crate::error::GeneratorError;
use crate::generator::ValueGenerator;
use async_trait::async_trait;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::Rng;
use relgen_core::{Column, Schema, Value, ValueSet};

/// Picks one value of the set per row.
#[derive(Debug)]
pub struct ValueSetGenerator {
    values: Vec<Value>,
    weights: Option<WeightedIndex<f64>>,
    rng: StdRng,
}

impl ValueSetGenerator {
    pub fn new(column: &Column, set: &ValueSet, rng: StdRng) -> Result<Self, GeneratorError> {
        set.check()
            .map_err(|reason| GeneratorError::InvalidValueSet {
                column: column.name.clone(),
                reason,
            })?;

        let values = set
            .values
            .iter()
            .map(|yaml| Schema::literal(column, yaml))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| GeneratorError::Literal {
                column: column.name.clone(),
                source,
            })?;

        let weights = set
            .weights
            .as_ref()
            .map(|w| WeightedIndex::new(w.iter().copied()))
            .transpose()
            .map_err(|e| GeneratorError::InvalidValueSet {
                column: column.name.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            values,
            weights,
            rng,
        })
    }
}

#[async_trait]
impl ValueGenerator for ValueSetGenerator {
    async fn next_value(&mut self) -> Result<Value, GeneratorError> {
        let idx = match &self.weights {
            Some(weights) => weights.sample(&mut self.rng),
            None => self.rng.random_range(0..self.values.len()),
        };
        Ok(self.values[idx].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use relgen_core::ValueType;
    use serde_yaml::Value as YamlValue;

    fn column() -> Column {
        Column::new("tier")
    }

    fn set(values: &[&str], weights: Option<Vec<f64>>) -> ValueSet {
        ValueSet {
            values: values.iter().map(|v| YamlValue::from(*v)).collect(),
            weights,
        }
    }

    #[tokio::test]
    async fn test_uniform_choice_covers_all() {
        let mut generator = ValueSetGenerator::new(
            &column(),
            &set(&["gold", "silver", "bronze"], None),
            StdRng::seed_from_u64(1),
        )
        .unwrap();

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(generator.next_value().await.unwrap().to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_weight_never_chosen() {
        let mut generator = ValueSetGenerator::new(
            &column(),
            &set(&["gold", "silver"], Some(vec![0.0, 1.0])),
            StdRng::seed_from_u64(1),
        )
        .unwrap();

        for _ in 0..100 {
            assert_eq!(
                generator.next_value().await.unwrap(),
                Value::Text("silver".into())
            );
        }
    }

    #[tokio::test]
    async fn test_weights_converge_to_ratio() {
        let mut generator = ValueSetGenerator::new(
            &column(),
            &set(&["a", "b"], Some(vec![1.0, 3.0])),
            StdRng::seed_from_u64(7),
        )
        .unwrap();

        let (mut a, mut b) = (0u32, 0u32);
        for _ in 0..40_000 {
            match generator.next_value().await.unwrap() {
                Value::Text(v) if v == "a" => a += 1,
                Value::Text(v) if v == "b" => b += 1,
                other => panic!("Unexpected value {other:?}"),
            }
        }
        let ratio = f64::from(b) / f64::from(a);
        assert!((ratio - 3.0).abs() < 0.15, "b/a ratio was {ratio}");
    }

    #[tokio::test]
    async fn test_unweighted_draws_are_uniform() {
        let values = ["north", "south", "east", "west"];
        let mut generator =
            ValueSetGenerator::new(&column(), &set(&values, None), StdRng::seed_from_u64(11))
                .unwrap();

        let draws = 40_000;
        let mut counts = std::collections::HashMap::new();
        for _ in 0..draws {
            *counts
                .entry(generator.next_value().await.unwrap().to_string())
                .or_insert(0u32) += 1;
        }

        assert_eq!(counts.len(), values.len());
        let expected = f64::from(draws) / values.len() as f64;
        for (value, count) in counts {
            let deviation = (f64::from(count) - expected).abs() / expected;
            assert!(deviation < 0.05, "{value} drawn {count} times");
        }
    }

    #[tokio::test]
    async fn test_values_coerced_to_column_type() {
        let mut column = column();
        column.data_type = Some(ValueType::Int);
        let mut generator =
            ValueSetGenerator::new(&column, &set(&["7"], None), StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(generator.next_value().await.unwrap(), Value::Int(7));
    }

    #[test]
    fn test_invalid_sets_rejected() {
        let rng = || StdRng::seed_from_u64(1);
        assert!(matches!(
            ValueSetGenerator::new(&column(), &set(&[], None), rng()),
            Err(GeneratorError::InvalidValueSet { .. })
        ));
        assert!(matches!(
            ValueSetGenerator::new(&column(), &set(&["a", "b"], Some(vec![1.0])), rng()),
            Err(GeneratorError::InvalidValueSet { .. })
        ));

        let mut typed = column();
        typed.data_type = Some(ValueType::Int);
        assert!(matches!(
            ValueSetGenerator::new(&typed, &set(&["seven"], None), rng()),
            Err(GeneratorError::Literal { .. })
        ));
    }
}
