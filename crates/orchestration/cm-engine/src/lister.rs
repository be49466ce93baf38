//! Deadline-aware parallel listing of migration candidates.
//!
//! Fans paginated listing out across the configured filename prefixes with
//! bounded concurrency and merges the per-prefix results as tasks complete.
//! Ordering across prefixes is unspecified.

use std::collections::HashSet;
use std::sync::Arc;

use async_stream::try_stream;
use chrono::{DateTime, Duration, Utc};
use cm_error::StoreError;
use cm_store::ObjectStore;
use cm_types::{is_match_all_sentinel, Deadline, ObjectMeta};
use futures::{pin_mut, stream, Stream, StreamExt};
use tracing::{debug, warn};

use crate::filter::is_eligible;
use crate::retry::{with_retry, RetryPolicy};

/// Maximum simultaneous listing tasks, regardless of prefix count.
pub const MAX_PARALLEL_LISTS: usize = 10;

/// The result of materializing the candidate list.
#[derive(Debug, Default)]
pub struct ListOutcome {
    /// Eligible objects, merged across prefixes and deduplicated by name
    pub objects: Vec<ObjectMeta>,

    /// Listing tasks that failed after retries
    pub failed_tasks: usize,

    /// Listing tasks launched
    pub total_tasks: usize,

    /// The last task failure, kept for run-level error reporting
    pub last_error: Option<StoreError>,
}

impl ListOutcome {
    /// Whether every listing task failed (and at least one ran).
    pub fn all_tasks_failed(&self) -> bool {
        self.total_tasks > 0 && self.failed_tasks == self.total_tasks
    }
}

/// Stream every object in the bucket, handling pagination.
///
/// Each page fetch goes through the retry executor.
fn raw_objects(
    store: Arc<dyn ObjectStore>,
    bucket: String,
    retry: RetryPolicy,
) -> impl Stream<Item = Result<ObjectMeta, StoreError>> {
    try_stream! {
        let mut page_token: Option<String> = None;

        loop {
            let page = with_retry(&retry, "list_page", &bucket, || {
                let store = store.clone();
                let bucket = bucket.clone();
                let token = page_token.clone();
                async move { store.list_page(&bucket, token.as_deref()).await }
            })
            .await?;

            for obj in page.objects {
                yield obj;
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
    }
}

/// One listing task: paginate the bucket, keep the objects eligible under
/// this task's prefix set.
async fn list_task(
    store: Arc<dyn ObjectStore>,
    bucket: String,
    prefixes: Vec<String>,
    min_age: Option<Duration>,
    now: DateTime<Utc>,
    target_class: String,
    retry: RetryPolicy,
    deadline: Deadline,
) -> Result<Vec<ObjectMeta>, StoreError> {
    if !deadline.should_continue() {
        debug!(bucket = %bucket, "Skipping listing task — shutdown buffer breached");
        return Ok(Vec::new());
    }

    let stream = raw_objects(store, bucket, retry);
    pin_mut!(stream);

    let mut eligible = Vec::new();
    while let Some(item) = stream.next().await {
        let obj = item?;

        if !deadline.should_continue() {
            debug!("Abandoning listing — shutdown buffer breached");
            break;
        }

        if is_eligible(&obj, &prefixes, min_age, now, &target_class) {
            eligible.push(obj);
        }
    }

    Ok(eligible)
}

/// Materialize the eligible candidates for a migration run.
///
/// With the match-all sentinel the bucket is listed once, unsharded. With
/// explicit prefixes one listing task runs per prefix, at most
/// [`MAX_PARALLEL_LISTS`] at a time, each filtering with its own prefix;
/// results merge in completion order and are deduplicated by name so
/// overlapping prefixes cannot schedule an object twice.
///
/// A failed task is logged and its results omitted; it does not disturb the
/// other prefixes. The deadline is consulted before each task starts and
/// before each candidate is kept - a breach abandons listing mid-page.
pub async fn list_eligible(
    store: Arc<dyn ObjectStore>,
    bucket: &str,
    prefixes: &[String],
    min_age: Option<Duration>,
    target_class: &str,
    retry: &RetryPolicy,
    deadline: &Deadline,
) -> ListOutcome {
    let task_prefix_sets: Vec<Vec<String>> = if is_match_all_sentinel(prefixes) {
        vec![prefixes.to_vec()]
    } else {
        prefixes.iter().map(|p| vec![p.clone()]).collect()
    };

    let total_tasks = task_prefix_sets.len();
    let now = Utc::now();

    debug!(
        bucket,
        tasks = total_tasks,
        "Starting parallel candidate listing"
    );

    let results: Vec<(String, Result<Vec<ObjectMeta>, StoreError>)> =
        stream::iter(task_prefix_sets.into_iter().map(|task_prefixes| {
            let store = store.clone();
            let bucket = bucket.to_string();
            let target_class = target_class.to_string();
            let retry = retry.clone();
            let deadline = deadline.clone();

            async move {
                let label = task_prefixes.join(",");
                let result = list_task(
                    store,
                    bucket,
                    task_prefixes,
                    min_age,
                    now,
                    target_class,
                    retry,
                    deadline,
                )
                .await;
                (label, result)
            }
        }))
        .buffer_unordered(MAX_PARALLEL_LISTS)
        .collect()
        .await;

    let mut outcome = ListOutcome {
        total_tasks,
        ..Default::default()
    };
    let mut seen: HashSet<String> = HashSet::new();

    for (label, result) in results {
        match result {
            Ok(batch) => {
                for obj in batch {
                    if seen.insert(obj.name.clone()) {
                        outcome.objects.push(obj);
                    }
                }
            }
            Err(e) => {
                warn!(prefix = %label, error = %e, "Error listing for prefix");
                outcome.failed_tasks += 1;
                outcome.last_error = Some(e);
            }
        }
    }

    debug!(
        candidates = outcome.objects.len(),
        failed_tasks = outcome.failed_tasks,
        "Candidate listing complete"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_store::MemoryStore;

    const TARGET: &str = "COLDLINE";

    fn old() -> Option<DateTime<Utc>> {
        Some(Utc::now() - Duration::days(400))
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.put_object("src", "inv_001.pdf", TARGET, old());
        store.put_object("src", "inv_002.pdf", TARGET, old());
        store.put_object("src", "rpt_001.pdf", TARGET, old());
        store.put_object("src", "img_001.png", "STANDARD", old());
        store.put_object("src", "archive/", TARGET, old());
        Arc::new(store)
    }

    fn fresh_deadline() -> Deadline {
        Deadline::start_default()
    }

    #[tokio::test]
    async fn test_match_all_lists_once() {
        let store = seeded_store();
        let outcome = list_eligible(
            store.clone(),
            "src",
            &[String::new()],
            None,
            TARGET,
            &RetryPolicy::default(),
            &fresh_deadline(),
        )
        .await;

        assert_eq!(outcome.total_tasks, 1);
        assert_eq!(outcome.failed_tasks, 0);
        // Wrong tier and folder placeholder are excluded.
        assert_eq!(outcome.objects.len(), 3);
        assert_eq!(store.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_prefix_tasks_filter_independently() {
        let store = seeded_store();
        let prefixes = vec!["inv_".to_string(), "rpt_".to_string()];
        let outcome = list_eligible(
            store.clone(),
            "src",
            &prefixes,
            None,
            TARGET,
            &RetryPolicy::default(),
            &fresh_deadline(),
        )
        .await;

        assert_eq!(outcome.total_tasks, 2);
        let mut names: Vec<String> = outcome.objects.iter().map(|o| o.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["inv_001.pdf", "inv_002.pdf", "rpt_001.pdf"]);
    }

    #[tokio::test]
    async fn test_overlapping_prefixes_deduplicate() {
        let store = seeded_store();
        let prefixes = vec!["inv".to_string(), "inv_".to_string()];
        let outcome = list_eligible(
            store,
            "src",
            &prefixes,
            None,
            TARGET,
            &RetryPolicy::default(),
            &fresh_deadline(),
        )
        .await;

        assert_eq!(outcome.objects.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_is_transparent() {
        let store = MemoryStore::new().with_page_size(2);
        for i in 0..5 {
            store.put_object("src", &format!("inv_{:03}.pdf", i), TARGET, old());
        }
        let store = Arc::new(store);

        let outcome = list_eligible(
            store.clone(),
            "src",
            &[String::new()],
            None,
            TARGET,
            &RetryPolicy::default(),
            &fresh_deadline(),
        )
        .await;

        assert_eq!(outcome.objects.len(), 5);
        assert!(store.list_calls() >= 3);
    }

    #[tokio::test]
    async fn test_failed_prefix_is_isolated() {
        let store = seeded_store();
        // One task eats the injected failure; the other lists normally.
        store.fail_next_list(StoreError::PermissionDenied("denied".into()));

        let prefixes = vec!["inv_".to_string(), "rpt_".to_string()];
        let outcome = list_eligible(
            store,
            "src",
            &prefixes,
            None,
            TARGET,
            &RetryPolicy::default(),
            &fresh_deadline(),
        )
        .await;

        assert_eq!(outcome.failed_tasks, 1);
        assert!(!outcome.all_tasks_failed());
        assert!(!outcome.objects.is_empty());
    }

    #[tokio::test]
    async fn test_total_listing_breakdown() {
        let store = seeded_store();
        store.fail_all_lists(StoreError::PermissionDenied("denied".into()));

        let outcome = list_eligible(
            store,
            "src",
            &[String::new()],
            None,
            TARGET,
            &RetryPolicy::default(),
            &fresh_deadline(),
        )
        .await;

        assert!(outcome.all_tasks_failed());
        assert!(outcome.last_error.is_some());
    }

    #[tokio::test]
    async fn test_expired_deadline_lists_nothing() {
        let store = seeded_store();
        let deadline = Deadline::new(std::time::Duration::ZERO, std::time::Duration::from_secs(30));

        let outcome = list_eligible(
            store.clone(),
            "src",
            &[String::new()],
            None,
            TARGET,
            &RetryPolicy::default(),
            &deadline,
        )
        .await;

        assert!(outcome.objects.is_empty());
        assert_eq!(outcome.failed_tasks, 0);
        assert_eq!(store.list_calls(), 0);
    }
}
