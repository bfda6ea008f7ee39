//! Identifier source
//!
//! Identifiers are read from the first column of a header-less CSV file and
//! handed out in chunks, so large inputs never have to be held in memory.

use csv::{Reader, ReaderBuilder, StringRecordsIntoIter, Trim};
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading the identifier source
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to open input file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read input CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input file {0} contains no part numbers")]
    Empty(PathBuf),
}

/// Iterator over chunks of identifiers
///
/// Each chunk holds at most `chunk_size` non-empty identifiers. Reading stops
/// after the first malformed row, which is yielded as an error.
pub struct IdentifierChunks {
    records: StringRecordsIntoIter<File>,
    chunk_size: usize,
    done: bool,
}

impl Iterator for IdentifierChunks {
    type Item = Result<Vec<String>, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut chunk = Vec::with_capacity(self.chunk_size.min(1024));
        while chunk.len() < self.chunk_size {
            match self.records.next() {
                Some(Ok(record)) => {
                    if let Some(identifier) = record.get(0).filter(|value| !value.is_empty()) {
                        chunk.push(identifier.to_string());
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if chunk.is_empty() {
            None
        } else {
            Some(Ok(chunk))
        }
    }
}

fn open_reader(path: &Path) -> Result<Reader<File>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file))
}

/// Streams the first column of a CSV file in chunks
///
/// # Example
///
/// ```no_run
/// use part_scout::input::read_identifiers_in_chunks;
/// use std::path::Path;
///
/// for chunk in read_identifiers_in_chunks(Path::new("parts.csv"), 500).unwrap() {
///     println!("{} identifiers", chunk.unwrap().len());
/// }
/// ```
pub fn read_identifiers_in_chunks(
    path: &Path,
    chunk_size: usize,
) -> Result<IdentifierChunks, InputError> {
    let reader = open_reader(path)?;
    Ok(IdentifierChunks {
        records: reader.into_records(),
        chunk_size: chunk_size.max(1),
        done: false,
    })
}

/// Counts the identifiers in a file, for progress reporting
pub fn count_identifiers(path: &Path) -> Result<usize, InputError> {
    let mut count = 0;
    for record in open_reader(path)?.into_records() {
        if record?.get(0).is_some_and(|value| !value.is_empty()) {
            count += 1;
        }
    }
    Ok(count)
}

/// Checks that the input file can be read and holds at least one identifier
pub fn validate_input_schema(path: &Path) -> Result<(), InputError> {
    match count_identifiers(path)? {
        0 => Err(InputError::Empty(path.to_path_buf())),
        _ => Ok(()),
    }
}
