//! Crawl coordinator - batch orchestration
//!
//! Drives one batch of input records through the lookup pipeline:
//! - Bounds worker concurrency and applies the shared rate limiter
//! - Dispatches each record to fetch + extract + merge
//! - Collects results back into input order, whatever order workers finish
//! - Publishes progress and honors cooperative cancellation
//!
//! Per-record failures never abort the batch; they surface as not-found
//! rows. The only batch-fatal errors happen in `new`, before any record
//! is touched.

use crate::config::Config;
use crate::crawler::aggregator::{build_search_url, merge, RecordOutcome};
use crate::crawler::extractor::extract;
use crate::crawler::fetcher::{build_http_client, FetchOutcome, Fetcher};
use crate::crawler::limiter::RateLimiter;
use crate::record::{CrawlResult, InputRecord};
use crate::state::{BatchState, ProgressState, ProgressTracker};
use crate::JikiuError;
use futures_util::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use url::Url;

/// What one batch run produced.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Terminal state of the batch.
    pub state: BatchState,
    /// Results in input order. The full batch on completion; on
    /// cancellation, exactly the records that completed before workers
    /// drained.
    pub results: Vec<CrawlResult>,
}

/// Main batch coordinator.
///
/// A coordinator runs exactly one batch. Construct, optionally subscribe
/// to progress and take the result stream, then `run`.
pub struct Coordinator {
    config: Config,
    base_url: Url,
    fetcher: Fetcher,
    limiter: RateLimiter,
    progress: ProgressTracker,
    cancel: CancellationToken,
    state: Mutex<BatchState>,
    results_tx: Mutex<Option<mpsc::UnboundedSender<(usize, CrawlResult)>>>,
    results_rx: Mutex<Option<mpsc::UnboundedReceiver<(usize, CrawlResult)>>>,
    streaming: AtomicBool,
}

impl Coordinator {
    /// Creates a coordinator from a validated configuration.
    ///
    /// Fails if the base URL does not parse or the HTTP client cannot be
    /// built; this is the batch-fatal startup path.
    pub fn new(config: Config) -> Result<Self, JikiuError> {
        let base_url = Url::parse(&config.catalog.base_url)?;
        let client = build_http_client(&config.catalog, &config.crawler)?;
        let fetcher = Fetcher::new(client, &config.crawler);
        let limiter = RateLimiter::new(config.crawler.requests_per_second);
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Ok(Self {
            config,
            base_url,
            fetcher,
            limiter,
            progress: ProgressTracker::new(0),
            cancel: CancellationToken::new(),
            state: Mutex::new(BatchState::Idle),
            results_tx: Mutex::new(Some(results_tx)),
            results_rx: Mutex::new(Some(results_rx)),
            streaming: AtomicBool::new(false),
        })
    }

    /// Token a host can use to request cooperative cancellation.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Subscribes to progress snapshots.
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }

    /// Takes the stream of per-record results, in completion order.
    ///
    /// The stream is finite and can be taken once; it yields `(original
    /// index, result)` pairs as workers finish and closes when the batch
    /// does.
    pub fn take_result_stream(
        &self,
    ) -> Option<mpsc::UnboundedReceiver<(usize, CrawlResult)>> {
        let taken = self.results_rx.lock().unwrap().take();
        if taken.is_some() {
            self.streaming.store(true, Ordering::SeqCst);
        }
        taken
    }

    /// Current batch state.
    pub fn state(&self) -> BatchState {
        *self.state.lock().unwrap()
    }

    /// Total HTTP requests the batch has sent so far.
    pub fn requests_sent(&self) -> u64 {
        self.fetcher.requests_sent()
    }

    /// Runs the batch over the given records.
    ///
    /// Returns results in input order. Every record yields exactly one
    /// result unless cancellation stops its worker first.
    pub async fn run(&self, records: Vec<InputRecord>) -> Result<BatchOutcome, JikiuError> {
        {
            let mut state = self.state.lock().unwrap();
            if *state != BatchState::Idle {
                return Err(JikiuError::BatchNotIdle(*state));
            }
            *state = BatchState::Running;
        }

        let total = records.len();
        self.progress.begin(total);
        tracing::info!(
            "Starting batch: {} records, {} workers, {} req/s",
            total,
            self.config.crawler.concurrency,
            self.config.crawler.requests_per_second
        );

        let start_time = std::time::Instant::now();
        let slots: Mutex<Vec<Option<CrawlResult>>> = Mutex::new(vec![None; total]);

        stream::iter(records.into_iter().enumerate())
            .for_each_concurrent(self.config.crawler.concurrency as usize, |(index, record)| {
                let slots = &slots;
                async move {
                    self.process_record(index, record, slots).await;
                }
            })
            .await;

        let final_state = if self.cancel.is_cancelled() {
            BatchState::Cancelled
        } else {
            BatchState::Completed
        };
        *self.state.lock().unwrap() = final_state;

        // Closes the result stream so consumers see the batch end
        self.results_tx.lock().unwrap().take();

        let results: Vec<CrawlResult> = slots
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .into_iter()
            .flatten()
            .collect();

        tracing::info!(
            "Batch {:?}: {}/{} records in {:?}, {} requests sent",
            final_state,
            results.len(),
            total,
            start_time.elapsed(),
            self.fetcher.requests_sent()
        );

        Ok(BatchOutcome {
            state: final_state,
            results,
        })
    }

    /// Processes one record through the lookup pipeline.
    ///
    /// A cancelled record (observed at loop top or while waiting in the
    /// limiter) produces nothing: no result slot, no progress tick. Every
    /// other path produces exactly one result.
    async fn process_record(
        &self,
        index: usize,
        record: InputRecord,
        slots: &Mutex<Vec<Option<CrawlResult>>>,
    ) {
        if self.cancel.is_cancelled() {
            return;
        }

        let lookup_url = build_search_url(&self.base_url, record.item_code.trim());

        let outcome = if !record.has_lookup_key() {
            tracing::debug!("Record {}: no item code, skipping lookup", index + 1);
            RecordOutcome::Skipped
        } else {
            if self.limiter.acquire(&self.cancel).await.is_err() {
                return;
            }

            match self.fetcher.fetch(&lookup_url, &self.cancel).await {
                FetchOutcome::Document(doc) => RecordOutcome::Extracted(extract(&doc)),
                FetchOutcome::Failure(failure) => {
                    tracing::debug!(
                        "Record {}: fetch failed ({:?} after {} attempts)",
                        index + 1,
                        failure.kind,
                        failure.attempts
                    );
                    RecordOutcome::Failed(failure)
                }
            }
        };

        let item_code = record.item_code.clone();
        let result = merge(record, lookup_url.as_str(), outcome);

        if self.streaming.load(Ordering::SeqCst) {
            if let Some(tx) = self.results_tx.lock().unwrap().as_ref() {
                let _ = tx.send((index, result.clone()));
            }
        }
        slots.lock().unwrap()[index] = Some(result);

        let progress = self.progress.record_completed();
        tracing::debug!(
            "Progress: {}/{} - {}",
            progress.current,
            progress.total,
            item_code
        );
        if progress.current % 10 == 0 || progress.current == progress.total {
            tracing::info!("Progress: {}/{} records", progress.current, progress.total);
        }
    }
}

/// Runs one batch with a fresh coordinator.
///
/// Convenience wrapper for hosts that need neither streaming results nor
/// external cancellation.
///
/// # Example
///
/// ```no_run
/// use jikiu_enrich::config::Config;
/// use jikiu_enrich::crawler::run_batch;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_batch(Config::default(), vec![]).await?;
/// println!("{} results", outcome.results.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_batch(
    config: Config,
    records: Vec<InputRecord>,
) -> Result<BatchOutcome, JikiuError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run(records).await
}
