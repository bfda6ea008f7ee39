//! Resume support: loading prior output and checking its schema

use crate::output::{OutputError, OutputFormat};
use crate::state::{ItemStatus, ProcessedSet, ResultRecord, PART_NUMBER_COLUMN, STATUS_COLUMN};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Results carried over from a previous run
#[derive(Debug, Clone, Default)]
pub struct PriorResults {
    /// Prior records with a non-failure status, in file order
    pub records: Vec<ResultRecord>,

    /// Identifiers of those records
    pub processed: ProcessedSet,
}

impl PriorResults {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Adds a prior row unless its status is retryable or its identifier repeats
    fn push(&mut self, record: ResultRecord) {
        if record.status().is_retryable() {
            return;
        }
        if self.processed.insert(record.identifier()) {
            self.records.push(record);
        }
    }
}

/// Loads the rows of a previous run that do not need to be processed again
///
/// Rows with a `FetchError` or `Error` status are left out so that a resumed
/// run retries them. A missing file yields empty results.
///
/// # Returns
///
/// * `Ok(PriorResults)` - Prior records and their identifiers
/// * `Err(OutputError)` - The file exists but cannot be read or lacks the identity columns
pub fn load_prior_results(path: &Path, format: OutputFormat) -> Result<PriorResults, OutputError> {
    if !path.exists() {
        return Ok(PriorResults::default());
    }

    let prior = match format {
        OutputFormat::Csv => load_csv(path)?,
        OutputFormat::Json => load_json(path)?,
        OutputFormat::Excel => load_xlsx(path)?,
    };

    tracing::info!(
        "Resume: loaded {} already processed items from {}",
        prior.len(),
        path.display()
    );
    Ok(prior)
}

fn load_csv(path: &Path) -> Result<PriorResults, OutputError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|row| -> Result<Vec<String>, OutputError> {
            Ok(row?.iter().map(str::to_string).collect())
        });
    load_rows(&headers, rows)
}

fn load_xlsx(path: &Path) -> Result<PriorResults, OutputError> {
    let Some((headers, rows)) = read_xlsx(path)? else {
        return Ok(PriorResults::default());
    };
    load_rows(&headers, rows.into_iter().map(Ok::<_, OutputError>))
}

/// Reads the first worksheet as a header row plus data rows
///
/// Returns None for a workbook whose first sheet is empty.
fn read_xlsx(path: &Path) -> Result<Option<(Vec<String>, Vec<Vec<String>>)>, OutputError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| OutputError::Schema("output workbook has no worksheet".to_string()))??;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    Ok(rows.next().map(|headers| (headers, rows.collect())))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(text) => text.clone(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Builds prior results from tabular rows under the given header
fn load_rows<I>(headers: &[String], rows: I) -> Result<PriorResults, OutputError>
where
    I: IntoIterator<Item = Result<Vec<String>, OutputError>>,
{
    let position = |column: &str| {
        headers
            .iter()
            .position(|header| header.trim() == column)
            .ok_or_else(|| {
                OutputError::Schema(format!("output file is missing the '{}' column", column))
            })
    };
    let part_number_at = position(PART_NUMBER_COLUMN)?;
    let status_at = position(STATUS_COLUMN)?;

    let mut prior = PriorResults::default();
    for row in rows {
        let row = row?;
        let identifier = row.get(part_number_at).map(|v| v.trim()).unwrap_or_default();
        let label = row.get(status_at).map(String::as_str).unwrap_or_default();
        let Some(mut record) = prior_record(identifier, label) else {
            continue;
        };

        for (index, (header, value)) in headers.iter().zip(row.iter()).enumerate() {
            if index != part_number_at && index != status_at {
                record.set(header.as_str(), value.as_str());
            }
        }
        prior.push(record);
    }
    Ok(prior)
}

fn load_json(path: &Path) -> Result<PriorResults, OutputError> {
    let reader = BufReader::new(File::open(path)?);
    let rows: Vec<serde_json::Value> = serde_json::from_reader(reader)?;

    let mut prior = PriorResults::default();
    for object in rows.iter().filter_map(|row| row.as_object()) {
        let text = |column: &str| object.get(column).map(json_text).unwrap_or_default();
        let Some(mut record) = prior_record(text(PART_NUMBER_COLUMN).trim(), &text(STATUS_COLUMN))
        else {
            continue;
        };

        for (column, value) in object {
            record.set(column.as_str(), json_text(value));
        }
        prior.push(record);
    }
    Ok(prior)
}

fn json_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Starts a record for a prior row, or None if the row is unusable
fn prior_record(identifier: &str, label: &str) -> Option<ResultRecord> {
    if identifier.is_empty() {
        return None;
    }
    match ItemStatus::from_label(label) {
        Some(status) => Some(ResultRecord::with_status(identifier, status)),
        None => {
            tracing::debug!("Resume: ignoring {} with unknown status '{}'", identifier, label);
            None
        }
    }
}

/// Checks that an existing CSV or Excel output contains every configured column
///
/// Missing files are fine; so is JSON, which carries no header.
pub fn validate_output_schema(
    path: &Path,
    format: OutputFormat,
    columns: &[String],
) -> Result<(), OutputError> {
    if !path.exists() {
        return Ok(());
    }

    let headers: Vec<String> = match format {
        OutputFormat::Json => return Ok(()),
        OutputFormat::Csv => {
            let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
            reader.headers()?.iter().map(str::to_string).collect()
        }
        OutputFormat::Excel => read_xlsx(path)?
            .map(|(headers, _)| headers)
            .unwrap_or_default(),
    };

    let missing: Vec<&str> = columns
        .iter()
        .map(String::as_str)
        .filter(|column| !headers.iter().any(|header| header.trim() == *column))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(OutputError::Schema(format!(
            "output {} missing columns: {}",
            format,
            missing.join(", ")
        )))
    }
}
