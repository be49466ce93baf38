//! Object-store backends for coldmove.
//!
//! The engine never talks to a backend SDK directly; it goes through the
//! [`ObjectStore`] trait so the store is an explicitly constructed, injected
//! dependency. Implementations:
//! - [`S3Store`] - S3-compatible backends (production)
//! - [`MemoryStore`] - in-memory store with fault injection (tests, local
//!   development)

mod memory;
mod s3;

pub use memory::MemoryStore;
pub use s3::{S3Store, S3StoreConfig};

use async_trait::async_trait;
use cm_error::StoreResult;
use cm_types::ObjectMeta;

/// One page of a bucket listing.
#[derive(Debug, Clone)]
pub struct ObjectPage {
    /// Objects in this page
    pub objects: Vec<ObjectMeta>,

    /// Token for the next page, `None` when this is the last page
    pub next_page_token: Option<String>,
}

/// The object-store operations the migration engine uses.
///
/// Exactly four operations: paginated listing, metadata fetch, cross-bucket
/// copy under the identical name, and delete. Implementations must be safe to
/// share across worker tasks behind an `Arc` - the engine reuses one client
/// for every call it makes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch one page of the bucket's objects.
    ///
    /// The returned metadata carries the listing field subset the engine
    /// filters on: name, update timestamp, and storage class.
    async fn list_page(&self, bucket: &str, page_token: Option<&str>) -> StoreResult<ObjectPage>;

    /// Fetch current metadata for one object.
    ///
    /// Returns `Ok(None)` when the object does not exist; errors are reserved
    /// for backend failures.
    async fn get_metadata(&self, bucket: &str, name: &str) -> StoreResult<Option<ObjectMeta>>;

    /// Copy an object to another bucket under the identical name.
    async fn copy_object(
        &self,
        source_bucket: &str,
        name: &str,
        destination_bucket: &str,
    ) -> StoreResult<()>;

    /// Delete an object.
    async fn delete_object(&self, bucket: &str, name: &str) -> StoreResult<()>;
}
