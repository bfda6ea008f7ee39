/// Item status definitions for per-identifier outcomes
///
/// Every identifier handed to the item pipeline ends in exactly one of these
/// terminal statuses; the label is what lands in the `Status` output column.
use std::fmt;

/// Terminal outcome of processing one identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemStatus {
    // ===== Success =====
    /// Exact match found and the required field resolved
    Success,

    // ===== Found, but incomplete =====
    /// Product page matched but the required (price-like) field is missing
    PriceNotFound,

    // ===== Not found =====
    /// Product page does not correspond to the queried identifier
    NoExactMatch,

    /// Search results contained no product link
    NotFound,

    /// Product link element present but its URL attribute is missing or empty
    ProductUrlNotFound,

    // ===== Failures =====
    /// Search request returned a non-200 status or an empty body
    SearchFailed,

    /// Product page request returned a non-200 status or an empty body
    ProductFetchFailed,

    /// Identifier did not match the site's identifier pattern
    InvalidPartNumber,

    /// All fetch attempts were exhausted
    FetchError,

    /// Any other unexpected error
    Error,

    /// Generic failure label written by older output files
    Failed,
}

/// Coarse grouping used for run summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    Success,
    NotFound,
    Failure,
}

impl ItemStatus {
    /// Returns the label written to the `Status` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::PriceNotFound => "Price Not Found",
            Self::NoExactMatch => "No Exact Match",
            Self::NotFound => "Not Found",
            Self::ProductUrlNotFound => "Product URL Not Found",
            Self::SearchFailed => "Search Failed",
            Self::ProductFetchFailed => "Product Fetch Failed",
            Self::InvalidPartNumber => "Invalid Part Number",
            Self::FetchError => "FetchError",
            Self::Error => "Error",
            Self::Failed => "Failed",
        }
    }

    /// Parses a status label as written by [`ItemStatus::as_str`]
    ///
    /// Returns None if the label doesn't match any known status.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Success" => Some(Self::Success),
            "Price Not Found" => Some(Self::PriceNotFound),
            "No Exact Match" => Some(Self::NoExactMatch),
            "Not Found" => Some(Self::NotFound),
            "Product URL Not Found" => Some(Self::ProductUrlNotFound),
            "Search Failed" => Some(Self::SearchFailed),
            "Product Fetch Failed" => Some(Self::ProductFetchFailed),
            "Invalid Part Number" => Some(Self::InvalidPartNumber),
            "FetchError" => Some(Self::FetchError),
            "Error" => Some(Self::Error),
            "Failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns true if a resumed run should process this identifier again
    ///
    /// Only transport exhaustion and unexpected errors are retried; every
    /// other status is a definitive answer from the site.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchError | Self::Error)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns the summary bucket this status is counted in
    pub fn bucket(&self) -> StatusBucket {
        match self {
            Self::Success => StatusBucket::Success,
            Self::NoExactMatch | Self::NotFound | Self::ProductUrlNotFound => {
                StatusBucket::NotFound
            }
            _ => StatusBucket::Failure,
        }
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Success,
            Self::PriceNotFound,
            Self::NoExactMatch,
            Self::NotFound,
            Self::ProductUrlNotFound,
            Self::SearchFailed,
            Self::ProductFetchFailed,
            Self::InvalidPartNumber,
            Self::FetchError,
            Self::Error,
            Self::Failed,
        ]
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pipeline stages an identifier moves through before reaching a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Searching,
    ProductFetching,
    Parsing,
    MatchChecking,
    Extracting,
}
