//! Object metadata as returned by store listings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one stored object.
///
/// This is the listing field subset the engine operates on: name, update
/// timestamp, and storage class, plus the bucket the object was listed from.
/// Immutable once produced by a listing; handed to exactly one transfer
/// worker for the duration of a transfer attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Bucket the object lives in
    pub bucket: String,

    /// Full object name (slash-delimited path within the bucket)
    pub name: String,

    /// Last-modified timestamp, if the backend reported one
    pub updated: Option<DateTime<Utc>>,

    /// Storage class/tier the object is currently in
    pub storage_class: String,
}

impl ObjectMeta {
    /// The base filename: everything after the last path separator.
    pub fn base_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or("")
    }

    /// Whether the name denotes a folder placeholder rather than an object.
    pub fn is_folder_placeholder(&self) -> bool {
        self.name.ends_with('/')
    }
}
