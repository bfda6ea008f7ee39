//! Run statistics and the end-of-run summary
//!
//! This module provides the counters accumulated while a batch runs and the
//! textual report printed (and logged) once it finishes.

use crate::state::{ItemStatus, ResultRecord, StatusBucket};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Outcome counts of a run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of items that reached a terminal status
    pub total: usize,

    /// Items with status `Success`
    pub success: usize,

    /// Items in the failure bucket
    pub failed: usize,

    /// Items in the not-found bucket
    pub not_found: usize,

    /// Count of items by status
    pub by_status: HashMap<ItemStatus, usize>,

    /// When the run started
    pub started_at: Option<DateTime<Local>>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a summary over existing records
    pub fn from_records<'a, I>(records: I, elapsed: Duration) -> Self
    where
        I: IntoIterator<Item = &'a ResultRecord>,
    {
        let mut summary = Self::new();
        for record in records {
            summary.record(record.status());
        }
        summary.elapsed = elapsed;
        summary
    }

    /// Counts one terminal status
    pub fn record(&mut self, status: ItemStatus) {
        self.total += 1;
        match status.bucket() {
            StatusBucket::Success => self.success += 1,
            StatusBucket::NotFound => self.not_found += 1,
            StatusBucket::Failure => self.failed += 1,
        }
        *self.by_status.entry(status).or_insert(0) += 1;
    }

    /// Number of items that ended with the given status
    pub fn count(&self, status: ItemStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Returns the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.success as f64 / self.total as f64) * 100.0
    }
}

/// Generates the one-paragraph summary report
///
/// Input and output file names, when given, are listed after the counts.
pub fn generate_summary_report(
    summary: &RunSummary,
    input_file: Option<&Path>,
    output_file: Option<&Path>,
) -> String {
    let mut report = format!(
        "All items processed. Total: {}. Success: {}. Failed: {}. Not Found: {}. \
         No Exact Match: {}. Total elapsed time: {:.2} seconds.",
        summary.total,
        summary.success,
        summary.failed,
        summary.not_found,
        summary.count(ItemStatus::NoExactMatch),
        summary.elapsed.as_secs_f64()
    );

    if input_file.is_some() || output_file.is_some() {
        report.push_str("\n\nFile Information:");
        if let Some(input) = input_file {
            report.push_str(&format!("\n- Input file: \"{}\"", file_name(input)));
        }
        if let Some(output) = output_file {
            report.push_str(&format!("\n- Output file: \"{}\"", file_name(output)));
        }
    }

    report
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Prints the per-status breakdown to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Scrape Summary ===\n");

    println!("Overview:");
    println!("  Total processed: {}", summary.total);
    println!("  Success: {}", summary.success);
    println!("  Failed: {}", summary.failed);
    println!("  Not Found: {}", summary.not_found);
    if let Some(started_at) = summary.started_at {
        println!("  Started: {}", started_at.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  Elapsed: {:.2}s", summary.elapsed.as_secs_f64());
    println!();

    if !summary.by_status.is_empty() {
        println!("Items by Status:");
        // Sort statuses by count (descending)
        let mut status_counts: Vec<_> = summary.by_status.iter().collect();
        status_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (status, count) in status_counts {
            let percentage = (*count as f64 / summary.total as f64) * 100.0;
            println!("  {:<24} {:>6} ({:.1}%)", status.as_str(), count, percentage);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} items)",
        summary.success_rate(),
        summary.success,
        summary.total
    );
}
