//! CSV output: one `<table>.csv` file per table.
//!
//! Honors the table options `delimiter` (a single byte, default `,`),
//! `header` (`true`/`false`, default `true`) and `null` (text written for
//! null values, default empty).

use csv::{Writer, WriterBuilder};
use relgen_core::{Table, Value};
use relgen_pipeline::{RowSink, SinkError, SinkFactory};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default buffer size for CSV writing.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Opens a CSV file per table in an output directory.
#[derive(Debug, Clone)]
pub struct CsvSinkFactory {
    output_dir: PathBuf,
}

impl CsvSinkFactory {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the file written for `table`.
    pub fn path_for(&self, table: &str) -> PathBuf {
        self.output_dir.join(format!("{table}.csv"))
    }
}

fn delimiter(table: &Table) -> Result<u8, SinkError> {
    match table.option("delimiter") {
        None => Ok(b','),
        Some("\\t") => Ok(b'\t'),
        Some(d) if d.len() == 1 => Ok(d.as_bytes()[0]),
        Some(d) => Err(SinkError::Encode(format!(
            "Delimiter for table '{}' must be a single byte, got '{d}'",
            table.name
        ))),
    }
}

fn header(table: &Table) -> Result<bool, SinkError> {
    match table.option("header") {
        None => Ok(true),
        Some(flag) => flag.parse().map_err(|_| {
            SinkError::Encode(format!(
                "Header option for table '{}' must be true or false, got '{flag}'",
                table.name
            ))
        }),
    }
}

impl SinkFactory for CsvSinkFactory {
    fn open(&self, table: &Table) -> Result<Box<dyn RowSink>, SinkError> {
        let delimiter = delimiter(table)?;
        let include_header = header(table)?;
        let null = table.option("null").unwrap_or_default().to_string();

        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.path_for(&table.name);
        let file = File::create(&path)?;
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, file));

        let columns: Vec<&str> = table.visible_columns().map(|c| c.name.as_str()).collect();
        if include_header {
            writer.write_record(&columns).map_err(encode)?;
        }
        debug!("Opened '{}' for table '{}'", path.display(), table.name);

        Ok(Box::new(CsvSink {
            path,
            width: columns.len(),
            null,
            writer: Some(writer),
            record: Vec::with_capacity(columns.len()),
        }))
    }
}

fn encode(e: csv::Error) -> SinkError {
    if e.is_io_error() {
        match e.into_kind() {
            csv::ErrorKind::Io(io) => SinkError::Io(io),
            other => SinkError::Encode(format!("{other:?}")),
        }
    } else {
        SinkError::Encode(e.to_string())
    }
}

/// Writes one table's rows to a CSV file.
pub struct CsvSink {
    path: PathBuf,
    width: usize,
    null: String,
    writer: Option<Writer<BufWriter<File>>>,
    record: Vec<String>,
}

impl RowSink for CsvSink {
    fn destination(&self) -> String {
        self.path.display().to_string()
    }

    fn write_row(&mut self, row: &[Value]) -> Result<(), SinkError> {
        if row.len() != self.width {
            return Err(SinkError::RowShape {
                expected: self.width,
                actual: row.len(),
            });
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(SinkError::Encode(format!(
                "'{}' is already finished",
                self.path.display()
            )));
        };

        self.record.clear();
        self.record.extend(row.iter().map(|value| match value {
            Value::Null => self.null.clone(),
            value => value.to_string(),
        }));
        writer.write_record(&self.record).map_err(encode)
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(())
    }
}
