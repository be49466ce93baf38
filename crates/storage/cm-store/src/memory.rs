//! In-memory object store for tests and local development.
//!
//! Behaves like a real backend over the [`ObjectStore`] trait - buckets must
//! exist, listings paginate, deletes of missing objects fail - and adds fault
//! injection so tests can script backend misbehavior per object or per call.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cm_error::{StoreError, StoreResult};
use cm_types::ObjectMeta;
use parking_lot::Mutex;

use crate::{ObjectPage, ObjectStore};

const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
struct StoredObject {
    updated: Option<DateTime<Utc>>,
    storage_class: String,
}

#[derive(Debug, Default)]
struct FaultPlan {
    /// Errors returned by upcoming `list_page` calls, one per call.
    list_errors: VecDeque<StoreError>,

    /// When set, every `list_page` call fails with this error.
    all_lists_fail: Option<StoreError>,

    /// Copy failures by object name.
    copy_failures: HashMap<String, StoreError>,

    /// Copies that report success without landing at the destination.
    silent_copy_drops: HashSet<String>,

    /// Delete failures by object name.
    delete_failures: HashMap<String, StoreError>,

    /// Metadata-fetch failures by "bucket/name".
    metadata_failures: HashMap<String, StoreError>,
}

/// In-memory [`ObjectStore`] with fault injection and call counting.
pub struct MemoryStore {
    buckets: Mutex<HashMap<String, BTreeMap<String, StoredObject>>>,
    faults: Mutex<FaultPlan>,
    page_size: usize,
    list_calls: AtomicU64,
    metadata_calls: AtomicU64,
    copy_calls: AtomicU64,
    delete_calls: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            faults: Mutex::new(FaultPlan::default()),
            page_size: DEFAULT_PAGE_SIZE,
            list_calls: AtomicU64::new(0),
            metadata_calls: AtomicU64::new(0),
            copy_calls: AtomicU64::new(0),
            delete_calls: AtomicU64::new(0),
        }
    }

    /// Set the listing page size (for exercising pagination).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Create a bucket.
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets.lock().entry(bucket.to_string()).or_default();
    }

    /// Insert an object, creating the bucket if needed.
    pub fn put_object(
        &self,
        bucket: &str,
        name: &str,
        storage_class: &str,
        updated: Option<DateTime<Utc>>,
    ) {
        self.buckets
            .lock()
            .entry(bucket.to_string())
            .or_default()
            .insert(
                name.to_string(),
                StoredObject {
                    updated,
                    storage_class: storage_class.to_string(),
                },
            );
    }

    /// Remove an object directly (bypassing fault injection).
    pub fn remove_object(&self, bucket: &str, name: &str) {
        if let Some(objects) = self.buckets.lock().get_mut(bucket) {
            objects.remove(name);
        }
    }

    /// Whether an object exists.
    pub fn contains(&self, bucket: &str, name: &str) -> bool {
        self.buckets
            .lock()
            .get(bucket)
            .is_some_and(|objects| objects.contains_key(name))
    }

    /// All object names in a bucket, sorted.
    pub fn object_names(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    // === Fault injection ===

    /// Fail the next `list_page` call with the given error.
    pub fn fail_next_list(&self, err: StoreError) {
        self.faults.lock().list_errors.push_back(err);
    }

    /// Fail every `list_page` call with the given error.
    pub fn fail_all_lists(&self, err: StoreError) {
        self.faults.lock().all_lists_fail = Some(err);
    }

    /// Fail every copy of the named object with the given error.
    pub fn fail_copies_of(&self, name: &str, err: StoreError) {
        self.faults.lock().copy_failures.insert(name.to_string(), err);
    }

    /// Make copies of the named object report success without landing.
    pub fn drop_copies_of(&self, name: &str) {
        self.faults
            .lock()
            .silent_copy_drops
            .insert(name.to_string());
    }

    /// Fail every delete of the named object with the given error.
    pub fn fail_deletes_of(&self, name: &str, err: StoreError) {
        self.faults
            .lock()
            .delete_failures
            .insert(name.to_string(), err);
    }

    /// Fail every metadata fetch for the object with the given error.
    pub fn fail_metadata_of(&self, bucket: &str, name: &str, err: StoreError) {
        self.faults
            .lock()
            .metadata_failures
            .insert(format!("{}/{}", bucket, name), err);
    }

    // === Call counters ===

    /// Number of `list_page` calls made.
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Number of `get_metadata` calls made.
    pub fn metadata_calls(&self) -> u64 {
        self.metadata_calls.load(Ordering::Relaxed)
    }

    /// Number of `copy_object` calls made.
    pub fn copy_calls(&self) -> u64 {
        self.copy_calls.load(Ordering::Relaxed)
    }

    /// Number of `delete_object` calls made.
    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::Relaxed)
    }

    /// Total number of store calls made.
    pub fn total_calls(&self) -> u64 {
        self.list_calls() + self.metadata_calls() + self.copy_calls() + self.delete_calls()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(&self, bucket: &str, page_token: Option<&str>) -> StoreResult<ObjectPage> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);

        {
            let mut faults = self.faults.lock();
            if let Some(err) = &faults.all_lists_fail {
                return Err(err.clone());
            }
            if let Some(err) = faults.list_errors.pop_front() {
                return Err(err);
            }
        }

        let buckets = self.buckets.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NotFound(format!("bucket {}", bucket)))?;

        // Pages start strictly after the token name.
        let page: Vec<(String, StoredObject)> = match page_token {
            Some(token) => objects
                .range::<String, _>((
                    std::ops::Bound::Excluded(token.to_string()),
                    std::ops::Bound::Unbounded,
                ))
                .take(self.page_size)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => objects
                .iter()
                .take(self.page_size)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };

        let next_page_token = if page.len() == self.page_size {
            page.last().map(|(name, _)| name.clone())
        } else {
            None
        };

        let metas = page
            .into_iter()
            .map(|(name, obj)| ObjectMeta {
                bucket: bucket.to_string(),
                name,
                updated: obj.updated,
                storage_class: obj.storage_class,
            })
            .collect();

        Ok(ObjectPage {
            objects: metas,
            next_page_token,
        })
    }

    async fn get_metadata(&self, bucket: &str, name: &str) -> StoreResult<Option<ObjectMeta>> {
        self.metadata_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(err) = self
            .faults
            .lock()
            .metadata_failures
            .get(&format!("{}/{}", bucket, name))
        {
            return Err(err.clone());
        }

        let buckets = self.buckets.lock();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NotFound(format!("bucket {}", bucket)))?;

        Ok(objects.get(name).map(|obj| ObjectMeta {
            bucket: bucket.to_string(),
            name: name.to_string(),
            updated: obj.updated,
            storage_class: obj.storage_class.clone(),
        }))
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        name: &str,
        destination_bucket: &str,
    ) -> StoreResult<()> {
        self.copy_calls.fetch_add(1, Ordering::Relaxed);

        let silent_drop = {
            let faults = self.faults.lock();
            if let Some(err) = faults.copy_failures.get(name) {
                return Err(err.clone());
            }
            faults.silent_copy_drops.contains(name)
        };

        let mut buckets = self.buckets.lock();
        let source_exists = buckets
            .get(source_bucket)
            .ok_or_else(|| StoreError::NotFound(format!("bucket {}", source_bucket)))?
            .contains_key(name);
        if !source_exists {
            return Err(StoreError::NotFound(format!("{}/{}", source_bucket, name)));
        }

        if silent_drop {
            return Ok(());
        }

        let destination = buckets
            .get_mut(destination_bucket)
            .ok_or_else(|| StoreError::NotFound(format!("bucket {}", destination_bucket)))?;
        destination.insert(
            name.to_string(),
            StoredObject {
                updated: Some(Utc::now()),
                storage_class: "STANDARD".to_string(),
            },
        );

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> StoreResult<()> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);

        if let Some(err) = self.faults.lock().delete_failures.get(name) {
            return Err(err.clone());
        }

        let mut buckets = self.buckets.lock();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NotFound(format!("bucket {}", bucket)))?;

        objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("{}/{}", bucket, name)))
    }
}
