//! Shared helpers for engine integration tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use cm_engine::{EngineConfig, Migrator, RetryPolicy};
use cm_store::MemoryStore;

pub const SOURCE: &str = "archive-source";
pub const DESTINATION: &str = "archive-destination";
pub const TARGET_CLASS: &str = "COLDLINE";

/// A last-modified timestamp comfortably past any age threshold.
pub fn old_timestamp() -> Option<DateTime<Utc>> {
    Some(Utc::now() - Duration::days(400))
}

/// A store with both buckets created and nothing else.
pub fn empty_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.create_bucket(SOURCE);
    store.create_bucket(DESTINATION);
    store
}

/// The scenario store: 3 eligible objects and 2 ineligible (wrong tier).
pub fn scenario_store() -> Arc<MemoryStore> {
    let store = empty_store();
    store.put_object(SOURCE, "inv_001.pdf", TARGET_CLASS, old_timestamp());
    store.put_object(SOURCE, "inv_002.pdf", TARGET_CLASS, old_timestamp());
    store.put_object(SOURCE, "inv_003.pdf", TARGET_CLASS, old_timestamp());
    store.put_object(SOURCE, "hot_001.bin", "STANDARD", old_timestamp());
    store.put_object(SOURCE, "hot_002.bin", "STANDARD", old_timestamp());
    store
}

/// A migrator over the given store, with a small worker pool to keep the
/// tests honest about concurrency without spawning 90 tasks.
pub fn migrator(store: Arc<MemoryStore>) -> Migrator {
    Migrator::new(
        store,
        EngineConfig::new()
            .with_max_workers(4)
            .with_target_storage_class(TARGET_CLASS)
            .with_retry(RetryPolicy::default()),
    )
}
