//! Result sinks
//!
//! A sink persists the cumulative result list of a run. Every configured
//! column is written for every record, missing values are filled with the
//! default, and the destination is always replaced atomically.

use crate::output::{write_atomic, OutputError, OutputFormat};
use crate::state::ResultRecord;
use rust_xlsxwriter::Workbook;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::{Path, PathBuf};

/// Trait for result sinks
pub trait ResultSink: Send {
    /// Replaces the destination with the given records
    ///
    /// # Arguments
    ///
    /// * `records` - Every result of the run so far, in collection order
    /// * `columns` - Output columns, in order
    fn persist(&self, records: &[ResultRecord], columns: &[String]) -> Result<(), OutputError>;

    /// Destination path
    fn path(&self) -> &Path;
}

/// Writes results as CSV with a header row
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for CsvSink {
    fn persist(&self, records: &[ResultRecord], columns: &[String]) -> Result<(), OutputError> {
        write_atomic(&self.path, |out| {
            let mut writer = csv::Writer::from_writer(out);
            writer.write_record(columns)?;
            for record in records {
                writer.write_record(record.to_row(columns))?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes results as a pretty-printed JSON array of objects
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// A record projected onto the output columns, serialized in column order
struct ProjectedRecord<'a> {
    record: &'a ResultRecord,
    columns: &'a [String],
}

impl Serialize for ProjectedRecord<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for column in self.columns {
            map.serialize_entry(column, self.record.value_or_default(column))?;
        }
        map.end()
    }
}

impl ResultSink for JsonSink {
    fn persist(&self, records: &[ResultRecord], columns: &[String]) -> Result<(), OutputError> {
        let rows: Vec<ProjectedRecord<'_>> = records
            .iter()
            .map(|record| ProjectedRecord { record, columns })
            .collect();

        write_atomic(&self.path, |out| {
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            out.write_all(b"\n")?;
            Ok(())
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// Writes results as an Excel workbook with a single sheet
///
/// The first row holds the column names; every cell is written as text.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for XlsxSink {
    fn persist(&self, records: &[ResultRecord], columns: &[String]) -> Result<(), OutputError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, column) in columns.iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| too_wide(columns.len()))?;
            sheet.write_string(0, col, column.as_str())?;
            for (row, record) in records.iter().enumerate() {
                let row = u32::try_from(row + 1)
                    .map_err(|_| OutputError::Schema("too many rows for a worksheet".into()))?;
                sheet.write_string(row, col, record.value_or_default(column))?;
            }
        }

        let buffer = workbook.save_to_buffer()?;
        write_atomic(&self.path, |out| {
            out.write_all(&buffer)?;
            Ok(())
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

fn too_wide(columns: usize) -> OutputError {
    OutputError::Schema(format!("{} columns do not fit in a worksheet", columns))
}

/// Creates the sink for an output format
pub fn sink_for(format: OutputFormat, path: impl Into<PathBuf>) -> Box<dyn ResultSink> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(path)),
        OutputFormat::Json => Box::new(JsonSink::new(path)),
        OutputFormat::Excel => Box::new(XlsxSink::new(path)),
    }
}
