//! Schema definitions for row generation.
//!
//! A schema is an ordered list of tables. Each table lists its columns and
//! every column names exactly one value source. Columns may reference a
//! column of another table, which makes the referencing table depend on the
//! referenced one.
//!
//! ```yaml
//! version: 1
//! seed: 42
//! tables:
//!   - name: customer
//!     count: 1K
//!     columns:
//!       - name: id
//!         gen: { type: sequence }
//!   - name: orders
//!     count: 5K
//!     columns:
//!       - name: id
//!         gen: { type: uuid }
//!       - name: customer_id
//!         ref: { table: customer, column: id }
//! ```

use crate::row_count::{RowCount, RowCountSpec};
use crate::stream::StreamKey;
use crate::types::ValueType;
use crate::values::Value;
use serde::{Deserialize, Serialize};
use serde_yaml::Value as YamlValue;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::warn;

// ============================================================================
// Error Types
// ============================================================================

/// Configuration error, raised before any producer starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Two tables share a name
    #[error("Duplicate table '{0}'")]
    DuplicateTable(String),

    /// Two columns of one table share a name
    #[error("Duplicate column '{column}' in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Table without columns
    #[error("Table '{0}' has no columns")]
    NoColumns(String),

    /// Row count pattern could not be parsed
    #[error("Invalid row count '{value}' for table '{table}'")]
    InvalidRowCount { table: String, value: String },

    /// Column declares no value source
    #[error("Column '{column}' in table '{table}' has no value source")]
    MissingValueSource { table: String, column: String },

    /// `each` on a column that is not a reference
    #[error("Column '{column}' in table '{table}' declares 'each' without 'ref'")]
    EachWithoutRef { table: String, column: String },

    /// More than one `each` column in a table
    #[error("Table '{table}' declares 'each' on both '{first}' and '{second}'")]
    MultipleEach {
        table: String,
        first: String,
        second: String,
    },

    /// `each` multiplier of zero
    #[error("Column '{column}' in table '{table}' has an 'each' multiplier of zero")]
    InvalidMultiplier { table: String, column: String },

    /// Reference to a table that does not exist
    #[error("Column '{column}' in table '{table}' references unknown table '{target}'")]
    UnknownRefTable {
        table: String,
        column: String,
        target: String,
    },

    /// Reference to a column that does not exist
    #[error(
        "Column '{column}' in table '{table}' references unknown column '{target_column}' of table '{target_table}'"
    )]
    UnknownRefColumn {
        table: String,
        column: String,
        target_table: String,
        target_column: String,
    },

    /// Malformed value set
    #[error("Column '{column}' in table '{table}' has an invalid value set: {reason}")]
    InvalidValueSet {
        table: String,
        column: String,
        reason: String,
    },

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),
}

// ============================================================================
// Settings
// ============================================================================

fn default_queue_capacity() -> usize {
    8192
}

fn default_exact_buffer_capacity() -> usize {
    8192
}

fn default_sample_buffer_capacity() -> usize {
    10_000
}

fn default_true() -> bool {
    true
}

/// Engine settings carried in the schema file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Bounded queue capacity of each topic
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Capacity of exact FIFO buffers
    #[serde(default = "default_exact_buffer_capacity")]
    pub exact_buffer_capacity: usize,

    /// Ring size of circular sample buffers
    #[serde(default = "default_sample_buffer_capacity")]
    pub sample_buffer_capacity: usize,

    /// Worker threads; defaults to the available parallelism
    #[serde(default)]
    pub workers: Option<usize>,

    /// Whether the host process should exit once the run finishes
    #[serde(default = "default_true")]
    pub exit_on_completion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            exact_buffer_capacity: default_exact_buffer_capacity(),
            sample_buffer_capacity: default_sample_buffer_capacity(),
            workers: None,
            exit_on_completion: true,
        }
    }
}

// ============================================================================
// Column Value Sources
// ============================================================================

/// How a referencing column consumes the upstream stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferPolicy {
    /// Every upstream value consumed exactly once, in order
    Exact,
    /// Random sample from the most recent upstream values
    Sample,
    /// Always the most recently published value
    Latest,
}

/// Reference to another table's column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ref {
    /// Upstream table
    pub table: String,

    /// Upstream column
    pub column: String,

    /// Buffer policy; see [`Column::buffer_policy`] for the default
    #[serde(default)]
    pub policy: Option<BufferPolicy>,
}

impl Ref {
    /// Key of the upstream stream this reference consumes.
    pub fn stream_key(&self) -> StreamKey {
        StreamKey::new(&self.table, &self.column)
    }
}

fn default_multiplier() -> u32 {
    1
}

/// Fan-out: each upstream value drives `multiplier` dependent rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Each {
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
}

/// Identity generator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenType {
    /// Random UUID v4
    Uuid,
    /// In-process integer sequence
    Sequence,
    /// Database sequence read in batches
    DatabaseSequence,
    /// Monotonic row identifier
    OrderedRowId,
    /// Unique but non-monotonic row identifier
    UnorderedRowId,
}

fn default_batch_size() -> usize {
    1000
}

/// Identity generation spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gen {
    /// Generator kind
    #[serde(rename = "type")]
    pub kind: GenType,

    /// First identifier (default 1)
    #[serde(default)]
    pub from: Option<i64>,

    /// Last identifier allowed, inclusive
    #[serde(default)]
    pub to: Option<i64>,

    /// Increment between identifiers (default 1)
    #[serde(default)]
    pub step: Option<i64>,

    /// Database sequence name
    #[serde(default)]
    pub sequence: Option<String>,

    /// Identifiers fetched per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

/// Temporal range kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    Date,
    Time,
    #[serde(rename = "datetime", alias = "date_time")]
    DateTime,
}

/// Unit of a range step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

fn default_step() -> i64 {
    1
}

/// Temporal generation spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    /// Range kind
    #[serde(rename = "type")]
    pub kind: RangeKind,

    /// First value; the current time when omitted
    #[serde(default)]
    pub from: Option<String>,

    /// Upper bound, inclusive
    #[serde(default)]
    pub to: Option<String>,

    /// Step amount
    #[serde(default = "default_step")]
    pub step: i64,

    /// Step unit
    #[serde(default)]
    pub unit: Option<StepUnit>,
}

impl Range {
    /// Step unit, defaulting to days for dates and seconds otherwise.
    pub fn unit(&self) -> StepUnit {
        self.unit.unwrap_or(match self.kind {
            RangeKind::Date => StepUnit::Day,
            RangeKind::Time | RangeKind::DateTime => StepUnit::Second,
        })
    }
}

/// Candidate values with optional parallel weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSet {
    pub values: Vec<YamlValue>,

    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl ValueSet {
    /// Check the set shape, returning the reason when malformed.
    pub fn check(&self) -> Result<(), String> {
        if self.values.is_empty() {
            return Err("no values".to_string());
        }
        if let Some(weights) = &self.weights {
            if weights.len() != self.values.len() {
                return Err(format!(
                    "{} weights for {} values",
                    weights.len(),
                    self.values.len()
                ));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err("weights must be finite and non-negative".to_string());
            }
            if weights.iter().all(|w| *w == 0.0) {
                return Err("all weights are zero".to_string());
            }
        }
        Ok(())
    }
}

/// The resolved value source of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSource {
    Reference(Ref),
    Range(Range),
    Identity(Gen),
    Constant(YamlValue),
    Expression(String),
    Set(ValueSet),
}

impl ColumnSource {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            ColumnSource::Reference(_) => "ref",
            ColumnSource::Range(_) => "range",
            ColumnSource::Identity(_) => "gen",
            ColumnSource::Constant(_) => "constant",
            ColumnSource::Expression(_) => "expression",
            ColumnSource::Set(_) => "set",
        }
    }
}

// ============================================================================
// Tables and Columns
// ============================================================================

/// Column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,

    /// Declared value type
    #[serde(rename = "type", default)]
    pub data_type: Option<ValueType>,

    #[serde(rename = "ref", default)]
    pub reference: Option<Ref>,

    #[serde(default)]
    pub range: Option<Range>,

    #[serde(default)]
    pub gen: Option<Gen>,

    #[serde(default)]
    pub constant: Option<YamlValue>,

    #[serde(default)]
    pub expression: Option<String>,

    #[serde(default)]
    pub set: Option<ValueSet>,

    #[serde(default)]
    pub each: Option<Each>,

    /// Excluded from output, still published to dependents
    #[serde(default)]
    pub hidden: bool,
}

impl Column {
    /// Create a column with no value source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            reference: None,
            range: None,
            gen: None,
            constant: None,
            expression: None,
            set: None,
            each: None,
            hidden: false,
        }
    }

    /// Resolve the value source, applying the precedence
    /// ref > range > gen > constant > expression > set.
    pub fn source(&self) -> Option<ColumnSource> {
        self.declared_sources().into_iter().next()
    }

    /// Names of sources that are set but ignored because of precedence.
    pub fn ignored_sources(&self) -> Vec<&'static str> {
        self.declared_sources()
            .iter()
            .skip(1)
            .map(ColumnSource::name)
            .collect()
    }

    fn declared_sources(&self) -> Vec<ColumnSource> {
        let mut sources = Vec::new();
        if let Some(r) = &self.reference {
            sources.push(ColumnSource::Reference(r.clone()));
        }
        if let Some(r) = &self.range {
            sources.push(ColumnSource::Range(r.clone()));
        }
        if let Some(g) = &self.gen {
            sources.push(ColumnSource::Identity(g.clone()));
        }
        if let Some(c) = &self.constant {
            sources.push(ColumnSource::Constant(c.clone()));
        }
        if let Some(e) = &self.expression {
            sources.push(ColumnSource::Expression(e.clone()));
        }
        if let Some(s) = &self.set {
            sources.push(ColumnSource::Set(s.clone()));
        }
        sources
    }

    /// Buffer policy of a referencing column: explicit, else `exact` for
    /// fan-out columns and `sample` otherwise.
    pub fn buffer_policy(&self) -> Option<BufferPolicy> {
        let reference = self.reference.as_ref()?;
        Some(reference.policy.unwrap_or(if self.each.is_some() {
            BufferPolicy::Exact
        } else {
            BufferPolicy::Sample
        }))
    }
}

/// Table definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Table name
    pub name: String,

    /// Target row count; absent or zero means unbounded
    #[serde(default)]
    pub count: Option<RowCountSpec>,

    /// Ordered columns
    pub columns: Vec<Column>,

    /// Free-form import options passed to the row sink
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl Table {
    /// Create a table with the given columns and an unbounded row count.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            count: None,
            columns,
            options: BTreeMap::new(),
        }
    }

    /// Set the target row count.
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(RowCountSpec::Rows(count));
        self
    }

    /// Parsed target row count.
    pub fn row_count(&self) -> Result<RowCount, ConfigError> {
        match &self.count {
            None => Ok(RowCount::Unbounded),
            Some(spec) => spec.resolve().ok_or_else(|| ConfigError::InvalidRowCount {
                table: self.name.clone(),
                value: spec.to_string(),
            }),
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns written to the output, in order.
    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| !c.hidden)
    }

    /// The fan-out column, if any.
    pub fn each_column(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.each.is_some())
    }

    /// Get an import option.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns(self.name.clone()));
        }
        self.row_count()?;

        let mut seen = HashSet::new();
        let mut each_column: Option<&str> = None;

        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(ConfigError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }

            let source = column
                .source()
                .ok_or_else(|| ConfigError::MissingValueSource {
                    table: self.name.clone(),
                    column: column.name.clone(),
                })?;

            let ignored = column.ignored_sources();
            if !ignored.is_empty() {
                warn!(
                    "Column '{}.{}' uses '{}'; ignoring {:?}",
                    self.name,
                    column.name,
                    source.name(),
                    ignored
                );
            }

            if let ColumnSource::Set(set) = &source {
                set.check().map_err(|reason| ConfigError::InvalidValueSet {
                    table: self.name.clone(),
                    column: column.name.clone(),
                    reason,
                })?;
            }

            if let Some(each) = &column.each {
                if column.reference.is_none() {
                    return Err(ConfigError::EachWithoutRef {
                        table: self.name.clone(),
                        column: column.name.clone(),
                    });
                }
                if each.multiplier == 0 {
                    return Err(ConfigError::InvalidMultiplier {
                        table: self.name.clone(),
                        column: column.name.clone(),
                    });
                }
                if let Some(first) = each_column {
                    return Err(ConfigError::MultipleEach {
                        table: self.name.clone(),
                        first: first.to_string(),
                        second: column.name.clone(),
                    });
                }
                each_column = Some(column.name.as_str());
            }
        }

        Ok(())
    }
}

// ============================================================================
// Schema
// ============================================================================

fn default_version() -> u32 {
    1
}

/// Full generation schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Schema version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Seed for deterministic generation
    #[serde(default)]
    pub seed: Option<u64>,

    /// Engine settings
    #[serde(default)]
    pub settings: Settings,

    /// Table definitions
    pub tables: Vec<Table>,

    /// Cached table lookup (not serialized)
    #[serde(skip)]
    table_map: HashMap<String, usize>,
}

impl Schema {
    /// Create a schema from table definitions with default settings.
    pub fn new(tables: Vec<Table>) -> Self {
        let mut schema = Self {
            version: default_version(),
            seed: None,
            settings: Settings::default(),
            tables,
            table_map: HashMap::new(),
        };
        schema.build_table_map();
        schema
    }

    /// Set the generation seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Load and validate a schema from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a schema from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut schema: Schema = serde_yaml::from_str(yaml)?;
        schema.build_table_map();
        schema.validate()?;
        Ok(schema)
    }

    /// Build the internal table lookup map.
    fn build_table_map(&mut self) {
        self.table_map = self
            .tables
            .iter()
            .enumerate()
            .map(|(idx, table)| (table.name.clone(), idx))
            .collect();
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.table_map
            .get(name)
            .and_then(|&idx| self.tables.get(idx))
    }

    /// Get all table names in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Check every structural invariant except reference cycles, which are
    /// detected when the dependency order is computed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for table in &self.tables {
            if !names.insert(table.name.as_str()) {
                return Err(ConfigError::DuplicateTable(table.name.clone()));
            }
        }

        for table in &self.tables {
            table.validate()?;
        }

        for table in &self.tables {
            for column in &table.columns {
                let Some(reference) = &column.reference else {
                    continue;
                };
                let target = self.get_table(&reference.table).ok_or_else(|| {
                    ConfigError::UnknownRefTable {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        target: reference.table.clone(),
                    }
                })?;
                if target.get_column(&reference.column).is_none() {
                    return Err(ConfigError::UnknownRefColumn {
                        table: table.name.clone(),
                        column: column.name.clone(),
                        target_table: reference.table.clone(),
                        target_column: reference.column.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Coerce a constant literal for a column.
    pub fn literal(column: &Column, yaml: &YamlValue) -> Result<Value, crate::ValueError> {
        let value = Value::from_yaml(yaml)?;
        match column.data_type {
            Some(ty) => value.coerce(ty),
            None => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop_yaml() -> &'static str {
        r#"
version: 1
seed: 7
settings:
  queue_capacity: 16
tables:
  - name: customer
    count: 1.5K
    columns:
      - name: id
        gen: { type: sequence, from: 100 }
      - name: tier
        set:
          values: [gold, silver]
          weights: [1, 3]
  - name: orders
    options:
      delimiter: "|"
    columns:
      - name: id
        gen: { type: uuid }
      - name: customer_id
        ref: { table: customer, column: id }
        each: { multiplier: 3 }
      - name: note
        constant: hello
        expression: "ignored {uuid}"
        hidden: true
"#
    }

    #[test]
    fn test_parse_schema() {
        let schema = Schema::from_yaml(shop_yaml()).unwrap();
        assert_eq!(schema.seed, Some(7));
        assert_eq!(schema.settings.queue_capacity, 16);
        assert_eq!(schema.settings.sample_buffer_capacity, 10_000);
        assert_eq!(schema.table_names(), vec!["customer", "orders"]);

        let customer = schema.get_table("customer").unwrap();
        assert_eq!(customer.row_count().unwrap(), RowCount::Bounded(1_500));

        let orders = schema.get_table("orders").unwrap();
        assert_eq!(orders.row_count().unwrap(), RowCount::Unbounded);
        assert_eq!(orders.option("delimiter"), Some("|"));
        assert_eq!(
            orders.visible_columns().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["id", "customer_id"]
        );
        assert_eq!(orders.each_column().unwrap().name, "customer_id");
    }

    #[test]
    fn test_source_precedence() {
        let schema = Schema::from_yaml(shop_yaml()).unwrap();
        let note = schema.get_table("orders").unwrap().get_column("note").unwrap();

        assert!(matches!(note.source(), Some(ColumnSource::Constant(_))));
        assert_eq!(note.ignored_sources(), vec!["expression"]);
    }

    #[test]
    fn test_default_buffer_policy() {
        let schema = Schema::from_yaml(shop_yaml()).unwrap();
        let orders = schema.get_table("orders").unwrap();
        assert_eq!(
            orders.get_column("customer_id").unwrap().buffer_policy(),
            Some(BufferPolicy::Exact)
        );
        assert_eq!(orders.get_column("id").unwrap().buffer_policy(), None);

        let mut sampled = orders.get_column("customer_id").unwrap().clone();
        sampled.each = None;
        assert_eq!(sampled.buffer_policy(), Some(BufferPolicy::Sample));
    }

    #[test]
    fn test_duplicate_table() {
        let yaml = r#"
tables:
  - name: a
    columns: [{ name: x, constant: 1 }]
  - name: a
    columns: [{ name: x, constant: 1 }]
"#;
        assert!(matches!(
            Schema::from_yaml(yaml),
            Err(ConfigError::DuplicateTable(name)) if name == "a"
        ));
    }

    #[test]
    fn test_duplicate_column() {
        let yaml = r#"
tables:
  - name: a
    columns:
      - { name: x, constant: 1 }
      - { name: x, constant: 2 }
"#;
        assert!(matches!(
            Schema::from_yaml(yaml),
            Err(ConfigError::DuplicateColumn { table, column }) if table == "a" && column == "x"
        ));
    }

    #[test]
    fn test_missing_value_source() {
        let yaml = r#"
tables:
  - name: a
    columns:
      - { name: x, hidden: true }
"#;
        assert!(matches!(
            Schema::from_yaml(yaml),
            Err(ConfigError::MissingValueSource { column, .. }) if column == "x"
        ));
    }

    #[test]
    fn test_malformed_row_count() {
        let yaml = r#"
tables:
  - name: a
    count: 12Q
    columns:
      - { name: x, constant: 1 }
"#;
        let err = Schema::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("12Q"));
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_numeric_row_count_out_of_range() {
        for count in ["-5", "1.5"] {
            let yaml = format!(
                "tables:\n  - name: a\n    count: {count}\n    columns:\n      - {{ name: x, constant: 1 }}\n"
            );
            match Schema::from_yaml(&yaml) {
                Err(ConfigError::InvalidRowCount { table, value }) => {
                    assert_eq!(table, "a");
                    assert_eq!(value, count);
                }
                other => panic!("Expected InvalidRowCount for {count}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unknown_reference() {
        let yaml = r#"
tables:
  - name: a
    columns:
      - { name: x, ref: { table: b, column: id } }
"#;
        assert!(matches!(
            Schema::from_yaml(yaml),
            Err(ConfigError::UnknownRefTable { target, .. }) if target == "b"
        ));

        let yaml = r#"
tables:
  - name: b
    columns: [{ name: id, gen: { type: uuid } }]
  - name: a
    columns:
      - { name: x, ref: { table: b, column: nope } }
"#;
        assert!(matches!(
            Schema::from_yaml(yaml),
            Err(ConfigError::UnknownRefColumn { target_column, .. }) if target_column == "nope"
        ));
    }

    #[test]
    fn test_each_rules() {
        let yaml = r#"
tables:
  - name: a
    columns:
      - { name: x, constant: 1, each: { multiplier: 2 } }
"#;
        assert!(matches!(
            Schema::from_yaml(yaml),
            Err(ConfigError::EachWithoutRef { .. })
        ));

        let yaml = r#"
tables:
  - name: b
    columns: [{ name: id, gen: { type: uuid } }]
  - name: a
    columns:
      - { name: x, ref: { table: b, column: id }, each: { multiplier: 2 } }
      - { name: y, ref: { table: b, column: id }, each: { multiplier: 2 } }
"#;
        assert!(matches!(
            Schema::from_yaml(yaml),
            Err(ConfigError::MultipleEach { first, second, .. }) if first == "x" && second == "y"
        ));
    }

    #[test]
    fn test_value_set_shape() {
        let yaml = r#"
tables:
  - name: a
    columns:
      - name: x
        set: { values: [1, 2, 3], weights: [1, 2] }
"#;
        let err = Schema::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("2 weights for 3 values"));
    }

    #[test]
    fn test_literal_coercion() {
        let mut column = Column::new("x");
        column.data_type = Some(ValueType::Int);
        let value = Schema::literal(&column, &YamlValue::String("12".into())).unwrap();
        assert_eq!(value, Value::Int(12));
    }
}
