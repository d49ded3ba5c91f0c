//! Column type declarations.
//!
//! A column may declare the type its values must take. Generators that
//! produce loosely-typed values (constants, value sets, expressions) coerce
//! their output into the declared type.
//!
//! # YAML Format
//!
//! ```yaml
//! type: int
//! type: datetime
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a generated column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// Unlimited text
    #[default]
    Text,

    /// 64-bit signed integer
    Int,

    /// 64-bit floating point
    Float,

    /// Boolean
    Bool,

    /// UUID (128-bit)
    Uuid,

    /// Date only (YYYY-MM-DD)
    Date,

    /// Time only (HH:MM:SS)
    Time,

    /// Timestamp without timezone
    #[serde(rename = "datetime", alias = "date_time")]
    DateTime,
}

impl ValueType {
    /// Name used in configuration files and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Uuid => "uuid",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
