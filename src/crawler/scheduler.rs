//! Batch scheduler
//!
//! Drives the item pipeline over a chunked identifier source:
//! - filters malformed and already-processed identifiers per chunk
//! - runs each chunk's items as Tokio tasks bounded by one global semaphore
//! - collects results in completion order, the only place that mutates the
//!   cumulative result list and the processed set
//! - persists the cumulative results atomically after every chunk
//! - stops on the shutdown signal after a final save

use crate::config::ScraperSettings;
use crate::crawler::pipeline::ItemPipeline;
use crate::input::InputError;
use crate::logging::SecretMask;
use crate::output::{OutputError, PriorResults, ResultSink, RunSummary};
use crate::state::{ProcessedSet, ResultRecord};
use crate::ScoutError;
use chrono::Local;
use regex::Regex;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::JoinSet;

/// Shape every identifier must have before it is scheduled at all
static IDENTIFIER_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w\-/\.]{1,64}$").expect("identifier shape regex is valid"));

/// Returns true if the trimmed identifier has an acceptable shape
pub fn is_valid_identifier(identifier: &str) -> bool {
    IDENTIFIER_SHAPE.is_match(identifier.trim())
}

/// Batching options of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Identifiers per chunk; results are persisted after each chunk
    pub chunk_size: usize,

    /// Process everything but never write the output file
    pub dry_run: bool,
}

impl BatchOptions {
    pub fn from_settings(settings: &ScraperSettings, dry_run: bool) -> Self {
        Self {
            chunk_size: settings.chunk_size.max(1),
            dry_run,
        }
    }
}

/// A completed item, as reported to observers
#[derive(Debug, Clone, Copy)]
pub struct ItemEvent<'a> {
    pub record: &'a ResultRecord,

    /// 1-based position of this completion within its chunk
    pub chunk_position: usize,
    pub chunk_len: usize,

    /// Items completed so far in this run, this one included
    pub completed: usize,

    /// Best-effort number of identifiers in the input
    pub total: Option<usize>,
}

/// Receives progress events while a batch runs
///
/// Events are delivered from the scheduler's collection point, in completion
/// order. They are not buffered or replayed.
pub trait RunObserver: Send {
    fn chunk_started(&mut self, _chunk_index: usize, _chunk_len: usize) {}

    fn item_completed(&mut self, _event: &ItemEvent<'_>) {}

    /// An item's task failed outside the pipeline (message already masked)
    fn item_failed(&mut self, _message: &str) {}

    fn chunk_finished(&mut self, _chunk_index: usize, _completed: usize, _elapsed: Duration) {}
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct SilentObserver;

impl RunObserver for SilentObserver {}

/// Outcome of a batch run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Counts over the items processed in this run
    pub summary: RunSummary,

    /// Cumulative results (prior results first), as persisted
    pub results: Vec<ResultRecord>,

    /// Identifiers handed to the pipeline
    pub attempted: usize,

    /// Identifiers dropped by the shape check
    pub skipped_invalid: usize,

    /// Identifiers skipped because they were already processed
    pub skipped_processed: usize,

    /// Items whose task failed outside the pipeline
    pub safety_net_failures: usize,

    /// True if the run stopped on the shutdown signal
    pub interrupted: bool,
}

/// Runs the item pipeline over chunks of identifiers
pub struct BatchScheduler {
    pipeline: Arc<ItemPipeline>,
    semaphore: Arc<Semaphore>,
    options: BatchOptions,
    sink: Box<dyn ResultSink>,
    columns: Vec<String>,
    results: Vec<ResultRecord>,
    processed: ProcessedSet,
    observer: Box<dyn RunObserver>,
    total: Option<usize>,
    mask: SecretMask,
}

impl BatchScheduler {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The item pipeline for the selected site
    /// * `concurrency_limit` - Maximum number of items in flight, for the whole run
    /// * `options` - Chunk size and dry-run flag
    /// * `sink` - Where the cumulative results are persisted
    pub fn new(
        pipeline: ItemPipeline,
        concurrency_limit: usize,
        options: BatchOptions,
        sink: Box<dyn ResultSink>,
    ) -> Self {
        let columns = pipeline.site().output_columns.clone();
        Self {
            pipeline: Arc::new(pipeline),
            semaphore: Arc::new(Semaphore::new(concurrency_limit.max(1))),
            options,
            sink,
            columns,
            results: Vec::new(),
            processed: ProcessedSet::new(),
            observer: Box::new(SilentObserver),
            total: None,
            mask: SecretMask::default(),
        }
    }

    /// Seeds the run with results loaded from a previous output file
    pub fn with_prior_results(mut self, prior: PriorResults) -> Self {
        self.results = prior.records;
        self.processed = prior.processed;
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the expected number of identifiers, for progress reporting
    pub fn with_total(mut self, total: Option<usize>) -> Self {
        self.total = total;
        self
    }

    pub fn with_mask(mut self, mask: SecretMask) -> Self {
        self.mask = mask;
        self
    }

    /// Processes every chunk of `source` until it is exhausted or `shutdown` resolves
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run completed or was interrupted after a final save
    /// * `Err(ScoutError)` - The input could not be read or the results could not be saved
    pub async fn run<I, F>(mut self, source: I, shutdown: F) -> Result<RunReport, ScoutError>
    where
        I: IntoIterator<Item = Result<Vec<String>, InputError>>,
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let mut report = RunReport::default();
        let mut summary = RunSummary::new();
        summary.started_at = Some(Local::now());
        let mut completed = 0usize;
        tokio::pin!(shutdown);

        for (chunk_index, chunk) in source.into_iter().enumerate() {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", self.mask.mask(&e.to_string()));
                    self.save()?;
                    return Err(e.into());
                }
            };

            let batch = self.filter_chunk(chunk, &mut report);
            if batch.is_empty() {
                continue;
            }

            let chunk_len = batch.len();
            self.observer.chunk_started(chunk_index, chunk_len);
            report.attempted += chunk_len;

            let mut tasks = JoinSet::new();
            for identifier in batch {
                let pipeline = Arc::clone(&self.pipeline);
                let semaphore = Arc::clone(&self.semaphore);
                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await?;
                    Ok::<ResultRecord, AcquireError>(pipeline.process(&identifier).await)
                });
            }

            let mut chunk_position = 0;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = &mut shutdown => None,
                    joined = tasks.join_next() => Some(joined),
                };
                let Some(joined) = next else {
                    report.interrupted = true;
                    break;
                };
                let Some(joined) = joined else {
                    break;
                };

                chunk_position += 1;
                completed += 1;

                match joined {
                    Ok(Ok(record)) => {
                        summary.record(record.status());
                        self.observer.item_completed(&ItemEvent {
                            record: &record,
                            chunk_position,
                            chunk_len,
                            completed,
                            total: self.total,
                        });
                        if self.processed.insert(record.identifier()) {
                            self.results.push(record);
                        }
                    }
                    Ok(Err(e)) => self.safety_net(&mut report, &e.to_string()),
                    Err(e) => self.safety_net(&mut report, &e.to_string()),
                }
            }

            if report.interrupted {
                tasks.abort_all();
                tracing::warn!(
                    "Interrupted; saving {} results before exiting",
                    self.results.len()
                );
                self.save()?;
                break;
            }

            self.save()?;
            self.observer
                .chunk_finished(chunk_index, completed, started.elapsed());
            tracing::info!(
                "Processed {} items so far. Elapsed time: {:.2} seconds.",
                completed,
                started.elapsed().as_secs_f64()
            );
        }

        summary.elapsed = started.elapsed();
        report.summary = summary;
        report.results = self.results;
        Ok(report)
    }

    /// Drops malformed and already-processed identifiers from a chunk
    fn filter_chunk(&self, chunk: Vec<String>, report: &mut RunReport) -> Vec<String> {
        let mut batch = Vec::with_capacity(chunk.len());
        let mut skipped_existing = 0;

        for identifier in chunk {
            if !is_valid_identifier(&identifier) {
                tracing::warn!(
                    "Skipping invalid part number: {}",
                    self.mask.mask(&identifier)
                );
                report.skipped_invalid += 1;
                continue;
            }
            if self.processed.contains(&identifier) {
                skipped_existing += 1;
                continue;
            }
            batch.push(identifier);
        }

        if skipped_existing > 0 {
            tracing::info!(
                "Resume: skipped {} already-processed items in this chunk",
                skipped_existing
            );
            report.skipped_processed += skipped_existing;
        }
        batch
    }

    fn safety_net(&mut self, report: &mut RunReport, message: &str) {
        let message = self.mask.mask(message);
        tracing::error!("Error processing part: {}", message);
        report.safety_net_failures += 1;
        self.observer.item_failed(&message);
    }

    /// Persists the cumulative results unless this is a dry run
    fn save(&self) -> Result<(), OutputError> {
        if self.options.dry_run {
            tracing::debug!("Dry run: not writing {}", self.sink.path().display());
            return Ok(());
        }
        self.sink.persist(&self.results, &self.columns)?;
        tracing::debug!(
            "Saved {} results to {}",
            self.results.len(),
            self.sink.path().display()
        );
        Ok(())
    }
}
