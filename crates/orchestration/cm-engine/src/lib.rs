//! The coldmove migration engine.
//!
//! Moves eligible objects from a source bucket to a destination bucket under
//! a hard wall-clock budget:
//!
//! 1. The [`lister`] fans paginated listing out across the configured
//!    filename prefixes and materializes the eligible candidates.
//! 2. The [`coordinator`] dispatches each candidate to a bounded worker pool.
//! 3. Each [`transfer`] worker runs the copy → verify → (delete) sequence,
//!    wrapping every store call in [`retry`] with exponential backoff.
//! 4. Outcomes are aggregated into a [`RunSummary`].
//!
//! Deletion is never attempted before the copy has been verified at the
//! destination; that ordering is the engine's core safety invariant.

pub mod coordinator;
pub mod filter;
pub mod lister;
pub mod retry;
pub mod summary;
pub mod transfer;

pub use coordinator::{EngineConfig, Migrator, DEFAULT_MAX_WORKERS, DEFAULT_TARGET_STORAGE_CLASS};
pub use filter::is_eligible;
pub use lister::{list_eligible, ListOutcome, MAX_PARALLEL_LISTS};
pub use retry::{with_retry, RetryPolicy};
pub use summary::RunSummary;
pub use transfer::transfer_object;
