//! State module for tracking per-item outcomes
//!
//! # Components
//!
//! - `ItemStatus`: the closed set of terminal statuses an identifier can reach
//! - `ResultRecord`: the column/value record produced for each identifier
//! - `ProcessedSet`: identifiers already finished with a non-failure status

mod item_status;
mod processed;
mod record;

// Re-export main types
pub use item_status::{ItemStatus, Stage, StatusBucket};
pub use processed::ProcessedSet;
pub use record::{
    ResultRecord, DEFAULT_VALUE, ERROR_COLUMN, EXISTS_COLUMN, IN_STOCK_COLUMN, PART_NUMBER_COLUMN,
    STATUS_CODE_COLUMN, STATUS_COLUMN,
};
