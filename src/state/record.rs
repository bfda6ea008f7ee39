//! Per-identifier result records

use crate::state::ItemStatus;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Column holding the queried identifier
pub const PART_NUMBER_COLUMN: &str = "Part Number";

/// Column holding the status label
pub const STATUS_COLUMN: &str = "Status";

/// Column holding the masked error text for failed items
pub const ERROR_COLUMN: &str = "Error";

/// Column holding the HTTP status of the last fetch
pub const STATUS_CODE_COLUMN: &str = "Status Code";

/// Column holding "Yes" when the product page matched the identifier
pub const EXISTS_COLUMN: &str = "Exists";

/// Derived column listing stock locations with a positive quantity
pub const IN_STOCK_COLUMN: &str = "In Stock";

/// Value used for anything that could not be resolved
pub const DEFAULT_VALUE: &str = "Not found";

/// Result of processing one identifier
///
/// Behaves like a mapping from column name to string value. `Part Number`
/// and `Status` are always present; every other column keeps the order in
/// which it was first set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    identifier: String,
    status: ItemStatus,
    fields: Vec<(String, String)>,
}

impl ResultRecord {
    /// Creates a record for an identifier that has not been processed yet
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            status: ItemStatus::Failed,
            fields: Vec::new(),
        }
    }

    /// Creates a record with a known status, e.g. when loading prior output
    pub fn with_status(identifier: impl Into<String>, status: ItemStatus) -> Self {
        Self {
            identifier: identifier.into(),
            status,
            fields: Vec::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn set_status(&mut self, status: ItemStatus) {
        self.status = status;
    }

    /// Returns the value of a column, including `Part Number` and `Status`
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            PART_NUMBER_COLUMN => Some(&self.identifier),
            STATUS_COLUMN => Some(self.status.as_str()),
            _ => self
                .fields
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.as_str()),
        }
    }

    /// Returns true if the column already has a value
    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Sets a column, replacing any previous value
    ///
    /// `Part Number` and `Status` are managed through the typed accessors
    /// and are ignored here.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        if column == PART_NUMBER_COLUMN || column == STATUS_COLUMN {
            return;
        }
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Returns the value for a column, or the default when missing
    pub fn value_or_default(&self, column: &str) -> &str {
        self.get(column).unwrap_or(DEFAULT_VALUE)
    }

    /// Projects the record onto the given columns, filling gaps with the default
    pub fn to_row(&self, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| self.value_or_default(column).to_string())
            .collect()
    }

    /// Iterates over the non-identity columns in insertion order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 2))?;
        map.serialize_entry(PART_NUMBER_COLUMN, &self.identifier)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(STATUS_COLUMN, self.status.as_str())?;
        map.end()
    }
}
