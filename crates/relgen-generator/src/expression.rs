//! Expression evaluation boundary.
//!
//! Expression columns hand their text to an [`ExpressionEvaluator`] together
//! with the expected column type and a shared [`Registry`] of variables and
//! functions. [`TemplateEvaluator`] is the built-in evaluator:
//!
//! - `{name}` - registry variable, or a function called with an empty argument
//! - `{name:arg}` - registry function called with `arg`
//!
//! Built-in functions registered by [`Registry::with_builtins`]:
//!
//! - `{uuid}` - random UUID
//! - `{rand:N}` - random N-digit number
//! - `{now}` / `{today}` - current UTC timestamp / date
//! - `{seq:key}` - per-key counter shared by every column using `key`

use rand::Rng;
use relgen_core::{Value, ValueError, ValueType};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Error raised by an expression evaluator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// Malformed expression text
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Unknown variable or function
    #[error("unknown name '{0}'")]
    UnknownName(String),

    /// Registry function failed
    #[error("function '{name}' failed: {reason}")]
    Function { name: String, reason: String },

    /// Result does not fit the expected type
    #[error(transparent)]
    Type(#[from] ValueError),
}

/// Function callable from expressions.
pub type RegistryFn = Arc<dyn Fn(&str) -> Result<Value, EvalError> + Send + Sync>;

/// Variables and functions shared by every expression column of a run.
#[derive(Clone, Default)]
pub struct Registry {
    variables: HashMap<String, Value>,
    functions: HashMap<String, RegistryFn>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("variables", &self.variables)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in functions.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();

        registry.register_function("uuid", |_| Ok(Value::Uuid(Uuid::new_v4())));

        registry.register_function("rand", |arg| {
            let digits: usize = arg.trim().parse().map_err(|_| EvalError::Function {
                name: "rand".to_string(),
                reason: format!("expected a digit count, got '{arg}'"),
            })?;
            Ok(Value::Text(random_digits(&mut rand::rng(), digits)))
        });

        registry.register_function("now", |_| {
            Ok(Value::DateTime(chrono::Utc::now().naive_utc()))
        });

        registry.register_function("today", |_| {
            Ok(Value::Date(chrono::Utc::now().date_naive()))
        });

        let counters: Arc<Mutex<HashMap<String, i64>>> = Arc::default();
        registry.register_function("seq", move |arg| {
            let mut counters = counters.lock().map_err(|_| EvalError::Function {
                name: "seq".to_string(),
                reason: "counter lock poisoned".to_string(),
            })?;
            let next = counters.entry(arg.to_string()).or_insert(0);
            *next += 1;
            Ok(Value::Int(*next))
        });

        registry
    }

    /// Set a variable.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// Register a function.
    pub fn register_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&str) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    /// Look up a variable.
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Look up a function.
    pub fn function(&self, name: &str) -> Option<&RegistryFn> {
        self.functions.get(name)
    }
}

/// Evaluates expression text into a value.
pub trait ExpressionEvaluator: Send + Sync {
    /// Evaluate `expression`, producing a value of type `expected`.
    fn evaluate(
        &self,
        expression: &str,
        expected: ValueType,
        registry: &Registry,
    ) -> Result<Value, EvalError>;

    /// Check an expression once, before any row is generated.
    fn check(&self, _expression: &str, _registry: &Registry) -> Result<(), EvalError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder { name: &'a str, arg: Option<&'a str> },
}

/// Template evaluator with `{name}` / `{name:arg}` placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEvaluator;

impl TemplateEvaluator {
    fn parse(expression: &str) -> Result<Vec<Segment<'_>>, EvalError> {
        let mut segments = Vec::new();
        let mut rest = expression;

        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    segments.push(Segment::Literal(rest));
                    break;
                }
                Some(pos) if rest.as_bytes()[pos] == b'}' => {
                    return Err(EvalError::Syntax(format!(
                        "unexpected '}}' in '{expression}'"
                    )));
                }
                Some(start) => {
                    if start > 0 {
                        segments.push(Segment::Literal(&rest[..start]));
                    }
                    let body_start = start + 1;
                    let end = rest[body_start..]
                        .find('}')
                        .map(|e| body_start + e)
                        .ok_or_else(|| {
                            EvalError::Syntax(format!("unclosed '{{' in '{expression}'"))
                        })?;
                    let body = &rest[body_start..end];
                    if body.contains('{') {
                        return Err(EvalError::Syntax(format!(
                            "nested '{{' in '{expression}'"
                        )));
                    }
                    let (name, arg) = match body.split_once(':') {
                        Some((name, arg)) => (name.trim(), Some(arg)),
                        None => (body.trim(), None),
                    };
                    if name.is_empty() {
                        return Err(EvalError::Syntax(format!(
                            "empty placeholder in '{expression}'"
                        )));
                    }
                    segments.push(Segment::Placeholder { name, arg });
                    rest = &rest[end + 1..];
                }
            }
        }

        Ok(segments)
    }

    fn resolve(name: &str, arg: Option<&str>, registry: &Registry) -> Result<Value, EvalError> {
        if arg.is_none() {
            if let Some(value) = registry.variable(name) {
                return Ok(value.clone());
            }
        }
        match registry.function(name) {
            Some(function) => function(arg.unwrap_or("")),
            None => Err(EvalError::UnknownName(name.to_string())),
        }
    }
}

impl ExpressionEvaluator for TemplateEvaluator {
    fn evaluate(
        &self,
        expression: &str,
        expected: ValueType,
        registry: &Registry,
    ) -> Result<Value, EvalError> {
        let segments = Self::parse(expression)?;

        // A lone placeholder keeps the type of the value it resolves to.
        if let [Segment::Placeholder { name, arg }] = segments.as_slice() {
            return Ok(Self::resolve(name, *arg, registry)?.coerce(expected)?);
        }

        let mut text = String::with_capacity(expression.len());
        for segment in &segments {
            match segment {
                Segment::Literal(s) => text.push_str(s),
                Segment::Placeholder { name, arg } => {
                    text.push_str(&Self::resolve(name, *arg, registry)?.to_string())
                }
            }
        }
        Ok(Value::Text(text).coerce(expected)?)
    }

    fn check(&self, expression: &str, registry: &Registry) -> Result<(), EvalError> {
        for segment in Self::parse(expression)? {
            if let Segment::Placeholder { name, arg } = segment {
                let known = registry.function(name).is_some()
                    || (arg.is_none() && registry.variable(name).is_some());
                if !known {
                    return Err(EvalError::UnknownName(name.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// Generate a random number with exactly N digits.
fn random_digits<R: Rng>(rng: &mut R, digits: usize) -> String {
    let mut result = String::with_capacity(digits);
    for i in 0..digits {
        // First digit should be 1-9 to avoid leading zeros
        let low = if i == 0 { 1 } else { 0 };
        let digit: u32 = rng.random_range(low..10);
        result.extend(char::from_digit(digit, 10));
    }
    result
}
