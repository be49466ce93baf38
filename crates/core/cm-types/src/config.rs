//! Migration request configuration and validation.

use chrono::Duration;
use cm_error::MoveError;
use serde::{Deserialize, Serialize};

/// Age thresholds at or below this many days are ignored.
///
/// Treating small thresholds as "no age filter" keeps a fat-fingered payload
/// from making recently written objects eligible for deletion.
pub const MIN_AGE_DAYS_FLOOR: u32 = 90;

/// Whether a prefix set is the match-all sentinel (a single empty string).
pub fn is_match_all_sentinel(prefixes: &[String]) -> bool {
    prefixes.len() == 1 && prefixes[0].is_empty()
}

/// A migration request: which objects to move, from where, to where.
///
/// Field names match the invocation payload one-for-one so the CLI can
/// deserialize the request JSON directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Bucket to migrate objects out of
    pub source_bucket: String,

    /// Bucket to migrate objects into
    pub destination_bucket: String,

    /// Base-filename prefixes to match (OR). `[""]` matches everything.
    #[serde(default = "default_prefixes")]
    pub filename_prefixes: Vec<String>,

    /// Only migrate objects at least this many days old. Honored only when
    /// above [`MIN_AGE_DAYS_FLOOR`].
    #[serde(default)]
    pub min_age_days_for_transfer: Option<u32>,

    /// Delete each source object after its copy has been verified.
    #[serde(default)]
    pub delete_source_after_transfer: bool,
}

fn default_prefixes() -> Vec<String> {
    vec![String::new()]
}

impl MigrationConfig {
    /// Create a request with defaults for everything but the buckets.
    pub fn new(source_bucket: impl Into<String>, destination_bucket: impl Into<String>) -> Self {
        Self {
            source_bucket: source_bucket.into(),
            destination_bucket: destination_bucket.into(),
            filename_prefixes: default_prefixes(),
            min_age_days_for_transfer: None,
            delete_source_after_transfer: false,
        }
    }

    /// Set the filename prefixes.
    pub fn with_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.filename_prefixes = prefixes;
        self
    }

    /// Set the minimum-age threshold in days.
    pub fn with_min_age_days(mut self, days: u32) -> Self {
        self.min_age_days_for_transfer = Some(days);
        self
    }

    /// Enable or disable source deletion after verified transfer.
    pub fn with_delete_source(mut self, delete_source: bool) -> Self {
        self.delete_source_after_transfer = delete_source;
        self
    }

    /// Whether the prefix set is the match-all sentinel.
    pub fn is_match_all(&self) -> bool {
        is_match_all_sentinel(&self.filename_prefixes)
    }

    /// The age filter actually in effect.
    ///
    /// Thresholds at or below [`MIN_AGE_DAYS_FLOOR`] are silently dropped.
    pub fn effective_min_age(&self) -> Option<Duration> {
        self.min_age_days_for_transfer
            .filter(|days| *days > MIN_AGE_DAYS_FLOOR)
            .map(|days| Duration::days(i64::from(days)))
    }

    /// Validate the request invariants.
    ///
    /// Violations are rejected before any remote call is made.
    pub fn validate(&self) -> Result<(), MoveError> {
        if self.source_bucket.is_empty() || self.destination_bucket.is_empty() {
            return Err(MoveError::Config(
                "Missing source or destination bucket name.".to_string(),
            ));
        }
        if self.source_bucket == self.destination_bucket {
            return Err(MoveError::Config(
                "Source and destination buckets must differ.".to_string(),
            ));
        }
        Ok(())
    }
}
