//! Aggregate counters for a migration run.

use cm_types::TransferOutcome;
use serde::{Deserialize, Serialize};

/// Counters aggregated across every processed object.
///
/// Created all-zero at run start, incremented as outcomes arrive (the
/// coordinator holds it behind a mutex), reported once at run end. `skipped`
/// exists for observability only; benign races are not failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Objects copied to the destination
    pub copied: u64,

    /// Copies confirmed present at the destination
    pub verified: u64,

    /// Source objects deleted after verification
    pub deleted: u64,

    /// Objects whose transfer failed
    pub failed: u64,

    /// Objects skipped because the source vanished before processing
    pub skipped: u64,
}

impl RunSummary {
    /// Create an all-zero summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one transfer outcome into the counters.
    ///
    /// Step flags count whether or not the transfer succeeded overall: an
    /// object that copied but failed verification still shows up in `copied`,
    /// alongside its `failed` increment.
    pub fn record(&mut self, outcome: &TransferOutcome) {
        let flags = outcome.flags();
        self.copied += u64::from(flags.copied);
        self.verified += u64::from(flags.verified);
        self.deleted += u64::from(flags.deleted);

        match outcome {
            TransferOutcome::Completed(_) => {}
            TransferOutcome::SkippedMissing => self.skipped += 1,
            TransferOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Record a worker that died without producing an outcome.
    pub fn record_worker_failure(&mut self) {
        self.failed += 1;
    }
}
