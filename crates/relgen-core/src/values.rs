//! Generated values.
//!
//! [`Value`] is the single value representation that flows from generators,
//! through topics and buffers, into row sinks.

use crate::types::ValueType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_yaml::Value as YamlValue;
use std::fmt;
use uuid::Uuid;

/// Error raised when a value cannot take the requested shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    /// The value cannot be represented as the target type
    #[error("cannot convert {value:?} to {target}")]
    Incompatible { value: String, target: ValueType },

    /// YAML node that has no scalar value representation
    #[error("unsupported literal: {0}")]
    UnsupportedLiteral(String),
}

/// A single generated column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// String value
    Text(String),

    /// UUID value
    Uuid(Uuid),

    /// Date without time
    Date(NaiveDate),

    /// Time of day
    Time(NaiveTime),

    /// Timestamp without timezone
    DateTime(NaiveDateTime),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Type of this value, `None` for null.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueType::Bool),
            Self::Int(_) => Some(ValueType::Int),
            Self::Float(_) => Some(ValueType::Float),
            Self::Text(_) => Some(ValueType::Text),
            Self::Uuid(_) => Some(ValueType::Uuid),
            Self::Date(_) => Some(ValueType::Date),
            Self::Time(_) => Some(ValueType::Time),
            Self::DateTime(_) => Some(ValueType::DateTime),
        }
    }

    /// Convert this value into `target`. Null stays null.
    pub fn coerce(self, target: ValueType) -> Result<Value, ValueError> {
        if self.value_type() == Some(target) || self.is_null() {
            return Ok(self);
        }

        let converted = match (&self, target) {
            (_, ValueType::Text) => Some(Value::Text(self.to_string())),

            (Value::Float(f), ValueType::Int) if f.fract() == 0.0 => Some(Value::Int(*f as i64)),
            (Value::Text(s), ValueType::Int) => s.trim().parse().ok().map(Value::Int),

            (Value::Int(i), ValueType::Float) => Some(Value::Float(*i as f64)),
            (Value::Text(s), ValueType::Float) => s.trim().parse().ok().map(Value::Float),

            (Value::Int(0), ValueType::Bool) => Some(Value::Bool(false)),
            (Value::Int(1), ValueType::Bool) => Some(Value::Bool(true)),
            (Value::Text(s), ValueType::Bool) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Some(Value::Bool(true)),
                "false" | "no" | "0" => Some(Value::Bool(false)),
                _ => None,
            },

            (Value::Text(s), ValueType::Uuid) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),

            (Value::DateTime(dt), ValueType::Date) => Some(Value::Date(dt.date())),
            (Value::Text(s), ValueType::Date) => parse_date(s).map(Value::Date),

            (Value::DateTime(dt), ValueType::Time) => Some(Value::Time(dt.time())),
            (Value::Text(s), ValueType::Time) => parse_time(s).map(Value::Time),

            (Value::Date(d), ValueType::DateTime) => {
                Some(Value::DateTime(d.and_time(NaiveTime::MIN)))
            }
            (Value::Text(s), ValueType::DateTime) => parse_datetime(s).map(Value::DateTime),

            _ => None,
        };

        converted.ok_or_else(|| ValueError::Incompatible {
            value: self.to_string(),
            target,
        })
    }

    /// Convert a YAML scalar into a value.
    pub fn from_yaml(yaml: &YamlValue) -> Result<Value, ValueError> {
        match yaml {
            YamlValue::Null => Ok(Value::Null),
            YamlValue::Bool(b) => Ok(Value::Bool(*b)),
            YamlValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Ok(Value::Text(n.to_string()))
                }
            }
            YamlValue::String(s) => Ok(Value::Text(s.clone())),
            YamlValue::Tagged(tagged) => Value::from_yaml(&tagged.value),
            YamlValue::Sequence(_) | YamlValue::Mapping(_) => Err(
                ValueError::UnsupportedLiteral(serde_yaml::to_string(yaml).unwrap_or_default()),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Parse a `HH:MM:SS` or `HH:MM` time of day.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Parse a timestamp in RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`
/// or date-only form.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }

    parse_date(s).map(|d| d.and_time(NaiveTime::MIN))
}
