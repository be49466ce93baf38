//! Per-object transfer outcomes.

use serde::{Deserialize, Serialize};

/// Which steps of the copy → verify → delete sequence completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFlags {
    /// The object was copied to the destination
    pub copied: bool,

    /// The copy was confirmed present at the destination
    pub verified: bool,

    /// The source object was deleted after verification
    pub deleted: bool,
}

/// The result of one object's transfer attempt.
///
/// Expected, frequent conditions are variants rather than errors: a source
/// object that vanished between listing and processing is a benign race, not
/// a failure to surface loudly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferOutcome {
    /// Every requested step completed.
    Completed(TransferFlags),

    /// The source object no longer existed at processing time.
    SkippedMissing,

    /// A step failed; `flags` records how far the transfer got.
    Failed {
        flags: TransferFlags,
        reason: String,
    },
}

impl TransferOutcome {
    /// Whether the transfer completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Completed(_))
    }

    /// The step flags, regardless of outcome.
    pub fn flags(&self) -> TransferFlags {
        match self {
            TransferOutcome::Completed(flags) => *flags,
            TransferOutcome::SkippedMissing => TransferFlags::default(),
            TransferOutcome::Failed { flags, .. } => *flags,
        }
    }
}
