//! Migration run coordination.
//!
//! Validates the request, materializes the candidate list, drives the
//! bounded worker pool, and aggregates outcomes under the deadline.

use std::sync::Arc;

use cm_error::{MoveError, StoreError};
use cm_store::ObjectStore;
use cm_types::{Deadline, MigrationConfig, TransferFlags, TransferOutcome};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::lister::list_eligible;
use crate::retry::RetryPolicy;
use crate::summary::RunSummary;
use crate::transfer::transfer_object;

/// Default ceiling on concurrent transfers.
pub const DEFAULT_MAX_WORKERS: usize = 90;

/// Storage class objects must be in to qualify for migration.
pub const DEFAULT_TARGET_STORAGE_CLASS: &str = "COLDLINE";

/// Progress is logged every this many processed objects.
const PROGRESS_LOG_INTERVAL: u64 = 1000;

/// Engine tuning, fixed per deployment rather than per request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent transfers
    pub max_workers: usize,

    /// Storage class objects must be in to qualify
    pub target_storage_class: String,

    /// Retry configuration for every store call
    pub retry: RetryPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            target_storage_class: DEFAULT_TARGET_STORAGE_CLASS.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new engine configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum concurrent transfers.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Set the qualifying storage class.
    pub fn with_target_storage_class(mut self, target: impl Into<String>) -> Self {
        self.target_storage_class = target.into();
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Drives migration runs against an injected object store.
pub struct Migrator {
    store: Arc<dyn ObjectStore>,
    engine: EngineConfig,
}

impl Migrator {
    /// Create a migrator over the given store.
    pub fn new(store: Arc<dyn ObjectStore>, engine: EngineConfig) -> Self {
        Self { store, engine }
    }

    /// Execute one migration run.
    ///
    /// Validates the request (rejections happen before any remote call),
    /// materializes the full candidate list, then dispatches transfers to a
    /// pool of at most `max_workers` concurrent workers and aggregates their
    /// outcomes in completion order.
    ///
    /// The candidate list is buffered in memory before dispatch; for very
    /// large buckets that is this design's scalability ceiling.
    ///
    /// Deadline handling is cooperative: once the shutdown buffer is
    /// breached, no further results are consumed and outstanding transfers
    /// are left to finish detached - their outcomes are not aggregated and
    /// no cancellation signal is sent. Per-object failures are reported
    /// through the summary's `failed` counter and do not fail the run; only
    /// an invalid request or a total listing breakdown does.
    pub async fn run(
        &self,
        config: &MigrationConfig,
        deadline: &Deadline,
    ) -> Result<RunSummary, MoveError> {
        config.validate()?;

        info!(
            source = %config.source_bucket,
            destination = %config.destination_bucket,
            prefixes = ?config.filename_prefixes,
            min_age_days = ?config.min_age_days_for_transfer,
            delete_source = config.delete_source_after_transfer,
            "Starting migration run"
        );

        let listing = list_eligible(
            self.store.clone(),
            &config.source_bucket,
            &config.filename_prefixes,
            config.effective_min_age(),
            &self.engine.target_storage_class,
            &self.engine.retry,
            deadline,
        )
        .await;

        if listing.all_tasks_failed() {
            return Err(MoveError::Listing(listing.last_error.unwrap_or_else(|| {
                StoreError::Other("no listing task succeeded".to_string())
            })));
        }

        if listing.objects.is_empty() {
            info!("No eligible objects found");
            return Ok(RunSummary::new());
        }

        info!(candidates = listing.objects.len(), "Dispatching transfers");

        let semaphore = Arc::new(Semaphore::new(self.engine.max_workers));
        let mut in_flight = FuturesUnordered::new();

        for object in listing.objects {
            let store = self.store.clone();
            let semaphore = semaphore.clone();
            let retry = self.engine.retry.clone();
            let source_bucket = config.source_bucket.clone();
            let destination_bucket = config.destination_bucket.clone();
            let delete_source = config.delete_source_after_transfer;
            let name = object.name.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return TransferOutcome::Failed {
                            flags: TransferFlags::default(),
                            reason: "worker pool closed".to_string(),
                        }
                    }
                };
                transfer_object(
                    &store,
                    &source_bucket,
                    &object,
                    &destination_bucket,
                    delete_source,
                    &retry,
                )
                .await
            });

            in_flight.push(async move { (name, handle.await) });
        }

        let summary = Mutex::new(RunSummary::new());
        let mut processed: u64 = 0;

        while let Some((name, joined)) = in_flight.next().await {
            if !deadline.should_continue() {
                warn!("Aborting result consumption — nearing timeout");
                break;
            }

            processed += 1;
            match joined {
                Ok(outcome) => summary.lock().record(&outcome),
                Err(e) => {
                    warn!(object = %name, error = %e, "Transfer worker died");
                    summary.lock().record_worker_failure();
                }
            }

            if processed % PROGRESS_LOG_INTERVAL == 0 {
                info!("Processed {} objects...", processed);
            }
        }

        // Dropping `in_flight` detaches any unconsumed transfers; they run to
        // completion in the background without being aggregated.
        drop(in_flight);

        let summary = summary.into_inner();
        info!(
            copied = summary.copied,
            verified = summary.verified,
            deleted = summary.deleted,
            failed = summary.failed,
            skipped = summary.skipped,
            "Migration run complete"
        );
        if summary.failed > 0 {
            warn!(
                failed = summary.failed,
                "Some objects failed to transfer; see logs for details"
            );
        }

        Ok(summary)
    }
}
