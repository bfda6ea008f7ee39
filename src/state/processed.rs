//! Set of identifiers that already reached a non-failure status

use std::collections::HashSet;

/// Identifiers that must not be fetched again during this run
///
/// Loaded once from prior output when resuming and grown monotonically as
/// results come in. Only the batch scheduler's collection point mutates it.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    identifiers: HashSet<String>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    /// Inserts an identifier, returning true if it was not present yet
    pub fn insert(&mut self, identifier: impl Into<String>) -> bool {
        self.identifiers.insert(identifier.into())
    }

    pub fn len(&self) -> usize {
        self.identifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ProcessedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            identifiers: iter.into_iter().map(Into::into).collect(),
        }
    }
}
