//! Poller metrics.

use metrics::counter;

/// Metric names.
pub mod names {
    /// Processed status checks by outcome
    pub const POLL_OUTCOMES_TOTAL: &str = "vdna_poll_outcomes_total";
}

/// Record the outcome of one status check.
pub fn record_poll_outcome(outcome: &'static str) {
    counter!(names::POLL_OUTCOMES_TOTAL, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_without_recorder() {
        // No recorder installed; recording must be a no-op.
        record_poll_outcome("pending");
        record_poll_outcome("discarded");
    }
}
