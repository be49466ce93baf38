//! Wall-clock budget for a migration run.

use std::time::{Duration, Instant};

/// Default hard execution budget for a run.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(3600);

/// Default buffer reserved before the timeout to stop starting new work.
pub const DEFAULT_SHUTDOWN_BUFFER: Duration = Duration::from_secs(30);

/// A shared, read-only wall-clock budget.
///
/// Components poll [`should_continue`](Deadline::should_continue) at
/// well-defined points (before yielding a listed object, before consuming a
/// completed transfer result). Nothing is forcibly cancelled: a breach only
/// prevents new work from being picked up, so cutoff is best-effort rather
/// than hard real-time.
#[derive(Debug, Clone)]
pub struct Deadline {
    started_at: Instant,
    timeout: Duration,
    shutdown_buffer: Duration,
}

impl Deadline {
    /// Start a deadline clock now with the given budget and buffer.
    pub fn new(timeout: Duration, shutdown_buffer: Duration) -> Self {
        Self {
            started_at: Instant::now(),
            timeout,
            shutdown_buffer,
        }
    }

    /// Start a deadline clock with the default budget and buffer.
    pub fn start_default() -> Self {
        Self::new(DEFAULT_RUN_TIMEOUT, DEFAULT_SHUTDOWN_BUFFER)
    }

    /// Seconds of budget left before the hard timeout.
    pub fn remaining(&self) -> Duration {
        self.timeout.saturating_sub(self.started_at.elapsed())
    }

    /// Whether there is enough budget left to keep taking on work.
    pub fn should_continue(&self) -> bool {
        self.remaining() > self.shutdown_buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_deadline_continues() {
        let deadline = Deadline::start_default();
        assert!(deadline.should_continue());
        assert!(deadline.remaining() > Duration::from_secs(3500));
    }

    #[test]
    fn test_exhausted_deadline_stops() {
        let deadline = Deadline::new(Duration::ZERO, Duration::from_secs(30));
        assert!(!deadline.should_continue());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_buffer_counts_against_budget() {
        // Budget smaller than the buffer: already inside the buffer zone.
        let deadline = Deadline::new(Duration::from_secs(10), Duration::from_secs(30));
        assert!(!deadline.should_continue());
    }
}
